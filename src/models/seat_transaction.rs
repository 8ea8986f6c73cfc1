use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Append-only audit record of every seat-state-changing action. The
/// single source of truth for what happened, independent of current
/// seat state. Never updated or deleted.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SeatTransaction {
    pub id: Uuid,
    pub seat_id: Uuid,
    pub user_id: Uuid,
    pub action: String,
    pub ticket_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

pub const ACTION_BOOK: &str = "BOOK";
pub const ACTION_CANCEL: &str = "CANCEL";
pub const ACTION_ON_HOLD: &str = "ON_HOLD";
pub const ACTION_EXPIRE: &str = "EXPIRE";
