pub mod booking;
pub mod grid;
pub mod holds;
pub mod lifecycle;
pub mod reclaimer;
pub mod seat_types;

use uuid::Uuid;

use crate::models::{EventStatus, SeatStatus};

/// Seat row as re-read under `FOR UPDATE` inside a hold or booking
/// transaction, joined to its current price and owning event status.
/// The lock is held until commit/rollback; concurrent writers on the
/// same seats serialize on it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LockedSeat {
    pub id: Uuid,
    pub event_id: Uuid,
    pub x: i32,
    pub y: i32,
    pub user_id: Option<Uuid>,
    pub status: String,
    pub price: f64,
    pub event_status: String,
}

impl LockedSeat {
    pub fn is_available(&self) -> bool {
        self.status.parse::<SeatStatus>() == Ok(SeatStatus::Available)
    }

    /// Whether `holder` may take or extend a hold on this seat.
    pub fn holdable_by(&self, holder: Uuid) -> bool {
        match self.status.parse::<SeatStatus>() {
            Ok(SeatStatus::Available) => true,
            // Re-issuing a hold extends the expiry.
            Ok(SeatStatus::OnHold) => self.user_id == Some(holder),
            _ => false,
        }
    }

    /// Whether `holder` may convert their own hold into a booking.
    pub fn confirmable_by(&self, holder: Uuid) -> bool {
        self.status.parse::<SeatStatus>() == Ok(SeatStatus::OnHold)
            && self.user_id == Some(holder)
    }

    pub fn event_cancelled(&self) -> bool {
        self.event_status.parse::<EventStatus>() == Ok(EventStatus::Cancelled)
    }
}

/// Locked re-read used by both the hold and booking paths. The seat rows
/// take exclusive locks; the event row takes a shared lock so concurrent
/// holds and bookings do not serialize on it, while a cancel transition
/// (which locks the event row exclusively) must wait for them to finish.
pub(crate) const LOCK_SEATS_SQL: &str = r#"
    SELECT s.id, s.event_id, s.x, s.y, s.user_id, s.status,
           st.price, e.status AS event_status
    FROM seats s
    JOIN seat_types st ON st.id = s.seat_type_id
    JOIN events e ON e.id = s.event_id
    WHERE s.id = ANY($1)
    FOR UPDATE OF s
    FOR SHARE OF e
"#;

/// Callers may repeat ids; every check below compares against the
/// deduplicated set.
pub(crate) fn dedup_ids(ids: &[Uuid]) -> Vec<Uuid> {
    let mut v = ids.to_vec();
    v.sort_unstable();
    v.dedup();
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locked_seat(status: SeatStatus, user_id: Option<Uuid>) -> LockedSeat {
        LockedSeat {
            id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            x: 1,
            y: 1,
            user_id,
            status: status.as_str().to_string(),
            price: 10.0,
            event_status: EventStatus::Published.as_str().to_string(),
        }
    }

    #[test]
    fn locked_read_pins_seats_exclusively_and_the_event_row_shared() {
        assert!(LOCK_SEATS_SQL.contains("FOR UPDATE OF s"));
        assert!(LOCK_SEATS_SQL.contains("FOR SHARE OF e"));
    }

    #[test]
    fn dedup_preserves_distinct_ids() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let out = dedup_ids(&[a, b, a, b, a]);
        assert_eq!(out.len(), 2);
        assert!(out.contains(&a) && out.contains(&b));
    }

    #[test]
    fn available_seat_is_holdable_by_anyone() {
        let s = locked_seat(SeatStatus::Available, None);
        assert!(s.holdable_by(Uuid::new_v4()));
        assert!(s.is_available());
    }

    #[test]
    fn held_seat_is_holdable_only_by_its_holder() {
        let holder = Uuid::new_v4();
        let s = locked_seat(SeatStatus::OnHold, Some(holder));
        assert!(s.holdable_by(holder));
        assert!(!s.holdable_by(Uuid::new_v4()));
        assert!(!s.is_available());
    }

    #[test]
    fn booked_and_disabled_seats_are_never_holdable() {
        let owner = Uuid::new_v4();
        assert!(!locked_seat(SeatStatus::Booked, Some(owner)).holdable_by(owner));
        assert!(!locked_seat(SeatStatus::Disabled, None).holdable_by(owner));
    }

    #[test]
    fn confirm_requires_the_holders_own_hold() {
        let holder = Uuid::new_v4();
        let s = locked_seat(SeatStatus::OnHold, Some(holder));
        assert!(s.confirmable_by(holder));
        assert!(!s.confirmable_by(Uuid::new_v4()));
        assert!(!locked_seat(SeatStatus::Available, None).confirmable_by(holder));
    }
}
