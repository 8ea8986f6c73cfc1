use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Seat {
    pub id: Uuid,
    pub event_id: Uuid,
    pub x: i32,
    pub y: i32,
    pub seat_type_id: Uuid,
    pub user_id: Option<Uuid>,
    pub status: String,
    pub hold_expires_at: Option<DateTime<Utc>>,
}

/// Seat lifecycle. Stored as text in the database; the enum exists so the
/// legal transitions live in one place instead of scattered string checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatStatus {
    Available,
    OnHold,
    Booked,
    Disabled,
}

impl SeatStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeatStatus::Available => "AVAILABLE",
            SeatStatus::OnHold => "ON_HOLD",
            SeatStatus::Booked => "BOOKED",
            SeatStatus::Disabled => "DISABLED",
        }
    }

    /// Transition table. Who may trigger a transition is enforced by the
    /// services; this only answers whether the edge exists at all.
    pub fn can_become(self, next: SeatStatus) -> bool {
        use SeatStatus::*;
        matches!(
            (self, next),
            (Available, OnHold)
                | (Available, Disabled)
                | (OnHold, Available)
                | (OnHold, Booked)
                | (Booked, Available)
                | (Disabled, Available)
        )
    }
}

impl fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeatStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AVAILABLE" => Ok(SeatStatus::Available),
            "ON_HOLD" => Ok(SeatStatus::OnHold),
            "BOOKED" => Ok(SeatStatus::Booked),
            "DISABLED" => Ok(SeatStatus::Disabled),
            other => Err(format!("unknown seat status: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_text() {
        for s in [
            SeatStatus::Available,
            SeatStatus::OnHold,
            SeatStatus::Booked,
            SeatStatus::Disabled,
        ] {
            assert_eq!(s.as_str().parse::<SeatStatus>(), Ok(s));
        }
        assert!("FREE".parse::<SeatStatus>().is_err());
    }

    #[test]
    fn booked_seats_only_return_via_refund() {
        use SeatStatus::*;
        assert!(Booked.can_become(Available));
        assert!(!Booked.can_become(OnHold));
        assert!(!Booked.can_become(Disabled));
    }

    #[test]
    fn held_seats_cannot_be_disabled() {
        assert!(!SeatStatus::OnHold.can_become(SeatStatus::Disabled));
    }
}
