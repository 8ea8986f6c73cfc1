use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Pricing tier. Every event carries exactly one default tier, created
/// with the event; unassigned seats fall back to it.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SeatType {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub price: f64,
    pub is_default: bool,
}

pub const DEFAULT_SEAT_TYPE_NAME: &str = "Standard";
