use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::seat_transaction::ACTION_ON_HOLD;
use crate::services::{dedup_ids, LockedSeat, LOCK_SEATS_SQL};

/// Rejects TTLs that overflow the timestamp range; the value comes
/// straight from the request body.
fn hold_expiry(now: DateTime<Utc>, ttl_seconds: i64) -> Result<DateTime<Utc>> {
    Duration::try_seconds(ttl_seconds)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| AppError::Validation("hold TTL too large".to_string()))
}

/// Time-boxed hold over a seat set for one holder.
///
/// All-or-nothing: the requested rows are locked and checked in one
/// transaction; if any seat is taken by someone else the whole call rolls
/// back with the unavailable ids and nothing is written. Re-holding seats
/// already held by the same holder extends the expiry.
pub async fn hold_seats(
    pool: &PgPool,
    holder_id: Uuid,
    seat_ids: &[Uuid],
    ttl_seconds: i64,
) -> Result<()> {
    if seat_ids.is_empty() {
        return Err(AppError::Validation("no seats selected".to_string()));
    }
    if ttl_seconds <= 0 {
        return Err(AppError::Validation(
            "hold TTL must be positive".to_string(),
        ));
    }
    let expires_at = hold_expiry(Utc::now(), ttl_seconds)?;

    let ids = dedup_ids(seat_ids);
    let mut tx = pool.begin().await?;

    let seats: Vec<LockedSeat> = sqlx::query_as(LOCK_SEATS_SQL)
        .bind(&ids)
        .fetch_all(&mut *tx)
        .await?;

    if seats.len() != ids.len() {
        return Err(AppError::SeatsNotFound);
    }
    if seats.iter().any(|s| s.event_cancelled()) {
        return Err(AppError::EventCancelled);
    }

    let unavailable: Vec<Uuid> = seats
        .iter()
        .filter(|s| !s.holdable_by(holder_id))
        .map(|s| s.id)
        .collect();

    if !unavailable.is_empty() {
        tx.rollback().await?;
        warn!(
            holder = %holder_id,
            rejected = unavailable.len(),
            "hold rejected, seats taken"
        );
        return Err(AppError::SeatUnavailable(unavailable));
    }

    sqlx::query(
        "UPDATE seats
         SET status = 'ON_HOLD', user_id = $1, hold_expires_at = $2
         WHERE id = ANY($3)",
    )
    .bind(holder_id)
    .bind(expires_at)
    .bind(&ids)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO seat_transactions (seat_id, user_id, action)
         SELECT unnest($1::uuid[]), $2, $3",
    )
    .bind(&ids)
    .bind(holder_id)
    .bind(ACTION_ON_HOLD)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(
        holder = %holder_id,
        seats = ids.len(),
        expires_at = %expires_at,
        "seats held"
    );
    Ok(())
}

/// Releases the caller's own holds, returning the seats to AVAILABLE.
pub async fn release_seats(pool: &PgPool, holder_id: Uuid, seat_ids: &[Uuid]) -> Result<u64> {
    if seat_ids.is_empty() {
        return Err(AppError::Validation("no seats selected".to_string()));
    }

    let ids = dedup_ids(seat_ids);

    // Only the holder's own ON_HOLD rows match, so a stale request
    // touching seats that have since been taken is a clean no-op for them.
    let released = sqlx::query(
        r#"
        WITH mine AS (
            SELECT id FROM seats
            WHERE id = ANY($1) AND status = 'ON_HOLD' AND user_id = $2
            FOR UPDATE
        ),
        released AS (
            UPDATE seats
            SET status = 'AVAILABLE', user_id = NULL, hold_expires_at = NULL
            WHERE id IN (SELECT id FROM mine)
        )
        INSERT INTO seat_transactions (seat_id, user_id, action)
        SELECT id, $2, $3 FROM mine
        "#,
    )
    .bind(&ids)
    .bind(holder_id)
    .bind(crate::models::seat_transaction::ACTION_EXPIRE)
    .execute(pool)
    .await?
    .rows_affected();

    info!(holder = %holder_id, released, "holds released");
    Ok(released)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_is_now_plus_ttl() {
        let now = Utc::now();
        let expiry = hold_expiry(now, 600).unwrap();
        assert_eq!(expiry - now, Duration::seconds(600));
    }

    #[test]
    fn oversized_ttl_is_a_validation_error_not_a_panic() {
        let res = hold_expiry(Utc::now(), i64::MAX);
        assert!(matches!(res, Err(AppError::Validation(_))));
    }
}
