use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One payment per successful booking; immutable once written. Payment
/// capture happens outside this system, we only record the result.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub amount: f64,
    pub method: String,
    pub created_at: DateTime<Utc>,
}

pub const PAYMENT_METHOD_CARD: &str = "CREDIT_CARD";
