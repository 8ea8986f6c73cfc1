use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub status: String,
    pub address: Option<String>,
    pub event_date: DateTime<Utc>,
    pub rows: i32,
    pub columns: i32,
    pub organizer_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    Draft,
    Pending,
    Verify,
    Published,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Draft => "DRAFT",
            EventStatus::Pending => "PENDING",
            EventStatus::Verify => "VERIFY",
            EventStatus::Published => "PUBLISHED",
            EventStatus::Cancelled => "CANCELLED",
        }
    }

    /// DRAFT -> PENDING -> VERIFY -> PUBLISHED, CANCELLED from any
    /// non-terminal state. DRAFT may skip straight to VERIFY; VERIFY may
    /// re-enter itself (the grid materialization is idempotent).
    pub fn can_become(self, next: EventStatus) -> bool {
        use EventStatus::*;
        matches!(
            (self, next),
            (Draft, Pending)
                | (Draft, Verify)
                | (Pending, Verify)
                | (Verify, Verify)
                | (Verify, Published)
                | (Draft, Cancelled)
                | (Pending, Cancelled)
                | (Verify, Cancelled)
                | (Published, Cancelled)
        )
    }

    /// PUBLISHED locks pricing; CANCELLED shuts everything down.
    pub fn pricing_mutable(self) -> bool {
        matches!(self, EventStatus::Draft | EventStatus::Pending | EventStatus::Verify)
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(EventStatus::Draft),
            "PENDING" => Ok(EventStatus::Pending),
            "VERIFY" => Ok(EventStatus::Verify),
            "PUBLISHED" => Ok(EventStatus::Published),
            "CANCELLED" => Ok(EventStatus::Cancelled),
            other => Err(format!("unknown event status: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::EventStatus::*;

    #[test]
    fn happy_path_is_linear() {
        assert!(Draft.can_become(Pending));
        assert!(Pending.can_become(Verify));
        assert!(Verify.can_become(Published));
        assert!(!Published.can_become(Draft));
        assert!(!Pending.can_become(Published));
    }

    #[test]
    fn draft_may_skip_straight_to_verify() {
        assert!(Draft.can_become(Verify));
    }

    #[test]
    fn verify_may_reenter_itself() {
        assert!(Verify.can_become(Verify));
    }

    #[test]
    fn cancelled_is_terminal_and_reachable_from_everywhere_else() {
        for s in [Draft, Pending, Verify, Published] {
            assert!(s.can_become(Cancelled));
        }
        for s in [Draft, Pending, Verify, Published, Cancelled] {
            assert!(!Cancelled.can_become(s));
        }
    }

    #[test]
    fn published_locks_pricing() {
        assert!(Verify.pricing_mutable());
        assert!(!Published.pricing_mutable());
        assert!(!Cancelled.pricing_mutable());
    }
}
