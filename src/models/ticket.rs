use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The price is snapshotted at booking time; later seat-type edits must
/// not change what the buyer paid.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub seat_id: Uuid,
    pub payment_id: Uuid,
    pub price: f64,
    pub status: String,
}

pub const TICKET_VALID: &str = "VALID";
pub const TICKET_REFUNDED: &str = "REFUNDED";

/// Projection for a buyer's ticket listing: ticket joined to its seat,
/// event and payment.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PurchasedTicket {
    pub ticket_id: Uuid,
    pub ticket_status: String,
    pub price: f64,
    pub payment_id: Uuid,
    pub payment_date: DateTime<Utc>,
    pub event_name: String,
    pub event_date: DateTime<Utc>,
    pub seat_id: Uuid,
    pub x: i32,
    pub y: i32,
    pub seat_type: String,
}
