use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::seat_transaction::ACTION_EXPIRE;
use crate::models::seat_type::DEFAULT_SEAT_TYPE_NAME;
use crate::models::{Event, EventStatus};
use crate::services::grid;

pub struct NewEvent {
    pub name: String,
    pub address: Option<String>,
    pub event_date: DateTime<Utc>,
    pub rows: i32,
    pub columns: i32,
    pub default_price: f64,
}

/// Creates the event in DRAFT together with its default pricing tier.
/// The default tier exists from day one so grid materialization always
/// has a fallback and it can never be deleted.
pub async fn create_event(pool: &PgPool, organizer_id: Uuid, new: NewEvent) -> Result<Event> {
    if new.name.trim().is_empty() {
        return Err(AppError::Validation("event name is required".to_string()));
    }
    if new.rows <= 0 || new.columns <= 0 {
        return Err(AppError::Validation(
            "rows and columns must be positive".to_string(),
        ));
    }
    if new.default_price < 0.0 {
        return Err(AppError::Validation(
            "default price must not be negative".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    let event = sqlx::query_as::<_, Event>(
        "INSERT INTO events (name, address, event_date, \"rows\", \"columns\", organizer_id)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING *",
    )
    .bind(&new.name)
    .bind(&new.address)
    .bind(new.event_date)
    .bind(new.rows)
    .bind(new.columns)
    .bind(organizer_id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO seat_types (event_id, name, price, is_default)
         VALUES ($1, $2, $3, TRUE)",
    )
    .bind(event.id)
    .bind(DEFAULT_SEAT_TYPE_NAME)
    .bind(new.default_price)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(event = %event.id, organizer = %organizer_id, "event created");
    Ok(event)
}

/// Moves an event along DRAFT -> PENDING -> VERIFY -> PUBLISHED (CANCELLED
/// from any non-terminal state). Entering VERIFY materializes the seat
/// grid; entering CANCELLED releases every outstanding hold. Both side
/// effects commit with the status change or not at all.
pub async fn transition(
    pool: &PgPool,
    event_id: Uuid,
    next: EventStatus,
    caller: &AuthUser,
) -> Result<Event> {
    let mut tx = pool.begin().await?;

    let event: Event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1 FOR UPDATE")
        .bind(event_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::EventNotFound)?;

    if !caller.is_admin && event.organizer_id != caller.user_id {
        return Err(AppError::NotAuthorized);
    }

    let current: EventStatus = event
        .status
        .parse()
        .map_err(|e: String| AppError::Internal(anyhow::anyhow!(e)))?;

    if !current.can_become(next) {
        return Err(AppError::InvalidTransition {
            from: current.to_string(),
            to: next.to_string(),
        });
    }

    match next {
        EventStatus::Verify => {
            let default_type_id = sqlx::query_scalar::<_, Uuid>(
                "SELECT id FROM seat_types WHERE event_id = $1 AND is_default",
            )
            .bind(event_id)
            .fetch_one(&mut *tx)
            .await?;

            grid::create_grid(&mut tx, event_id, event.rows, event.columns, default_type_id)
                .await?;
        }
        EventStatus::Cancelled => {
            let released = sqlx::query(
                r#"
                WITH held AS (
                    SELECT id, user_id FROM seats
                    WHERE event_id = $1 AND status = 'ON_HOLD'
                    FOR UPDATE
                ),
                released AS (
                    UPDATE seats
                    SET status = 'AVAILABLE', user_id = NULL, hold_expires_at = NULL
                    WHERE id IN (SELECT id FROM held)
                )
                INSERT INTO seat_transactions (seat_id, user_id, action)
                SELECT id, user_id, $2 FROM held
                "#,
            )
            .bind(event_id)
            .bind(ACTION_EXPIRE)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            info!(event = %event_id, released, "event cancelled, holds released");
        }
        _ => {}
    }

    let updated: Event =
        sqlx::query_as("UPDATE events SET status = $1 WHERE id = $2 RETURNING *")
            .bind(next.as_str())
            .bind(event_id)
            .fetch_one(&mut *tx)
            .await?;

    tx.commit().await?;

    info!(event = %event_id, from = %current, to = %next, "event status changed");
    Ok(updated)
}
