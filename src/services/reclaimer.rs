use sqlx::PgPool;
use tracing::info;

use crate::database::Database;
use crate::models::seat_transaction::ACTION_EXPIRE;

/// Background sweep that returns expired holds to AVAILABLE.
///
/// Runs on its own schedule, outside any request. One set-based statement:
/// rows locked by an in-flight hold or booking are skipped (`SKIP LOCKED`)
/// and resolved by whichever transaction commits first; anything still
/// expired is picked up on the next sweep.
pub struct ExpiryReclaimer {
    db: Database,
}

impl ExpiryReclaimer {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Idempotent: a sweep with nothing expired writes nothing.
    pub async fn reclaim_expired(&self) -> Result<u64, sqlx::Error> {
        let reclaimed = reclaim_expired(&self.db.pool).await?;
        if reclaimed > 0 {
            info!(reclaimed, "expired holds reclaimed");
        }
        Ok(reclaimed)
    }
}

pub async fn reclaim_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        WITH expired AS (
            SELECT id, user_id
            FROM seats
            WHERE status = 'ON_HOLD' AND hold_expires_at <= NOW()
            FOR UPDATE SKIP LOCKED
        ),
        released AS (
            UPDATE seats
            SET status = 'AVAILABLE', user_id = NULL, hold_expires_at = NULL
            WHERE id IN (SELECT id FROM expired)
        )
        INSERT INTO seat_transactions (seat_id, user_id, action)
        SELECT id, user_id, $1 FROM expired
        "#,
    )
    .bind(ACTION_EXPIRE)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
