use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Materializes the seat grid: one seat per `(x, y)` with `x` in
/// `1..=rows` and `y` in `1..=columns`, AVAILABLE, on the default tier.
/// Rectangle assignment follows the same axis convention. One set-based
/// insert; `ON CONFLICT DO NOTHING` on `(event_id, x, y)` makes re-entry
/// a no-op for positions that already have a seat.
pub async fn create_grid(
    tx: &mut Transaction<'_, Postgres>,
    event_id: Uuid,
    rows: i32,
    columns: i32,
    default_seat_type_id: Uuid,
) -> Result<u64> {
    let created = sqlx::query(
        "INSERT INTO seats (event_id, x, y, seat_type_id)
         SELECT $1, x, y, $2
         FROM generate_series(1, $3) AS x, generate_series(1, $4) AS y
         ON CONFLICT (event_id, x, y) DO NOTHING",
    )
    .bind(event_id)
    .bind(default_seat_type_id)
    .bind(rows)
    .bind(columns)
    .execute(&mut **tx)
    .await?
    .rows_affected();

    info!(event = %event_id, created, rows, columns, "seat grid materialized");
    Ok(created)
}

/// One cell of the public seat map: seat joined to its tier and price.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct SeatMapItem {
    pub seat_id: Uuid,
    pub x: i32,
    pub y: i32,
    pub status: String,
    pub hold_expires_at: Option<DateTime<Utc>>,
    pub seat_type_id: Uuid,
    pub seat_type: String,
    pub price: f64,
}

/// Read-only projection for viewers. Never locked; allowed to be stale
/// relative to in-flight holds and bookings.
pub async fn list_seat_map(pool: &PgPool, event_id: Uuid) -> Result<Vec<SeatMapItem>> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM events WHERE id = $1)")
        .bind(event_id)
        .fetch_one(pool)
        .await?;
    if !exists {
        return Err(AppError::EventNotFound);
    }

    let seats = sqlx::query_as::<_, SeatMapItem>(
        "SELECT s.id AS seat_id, s.x, s.y, s.status, s.hold_expires_at,
                st.id AS seat_type_id, st.name AS seat_type, st.price
         FROM seats s
         JOIN seat_types st ON st.id = s.seat_type_id
         WHERE s.event_id = $1
         ORDER BY s.y, s.x",
    )
    .bind(event_id)
    .fetch_all(pool)
    .await?;

    Ok(seats)
}

#[cfg(test)]
mod tests {
    use crate::services::seat_types::normalize_rect;

    // Mirrors the materialization insert: x runs 1..=rows, y runs
    // 1..=columns.
    fn cells(rows: i32, columns: i32) -> Vec<(i32, i32)> {
        (1..=rows)
            .flat_map(|x| (1..=columns).map(move |y| (x, y)))
            .collect()
    }

    #[test]
    fn full_grid_rectangle_covers_every_cell_in_any_corner_order() {
        let grid = cells(2, 3);
        assert_eq!(grid.len(), 6);

        let (x_lo, y_lo, x_hi, y_hi) = normalize_rect(2, 1, 1, 3);
        let covered = grid
            .iter()
            .filter(|(x, y)| (x_lo..=x_hi).contains(x) && (y_lo..=y_hi).contains(y))
            .count();
        assert_eq!(covered, grid.len());
    }
}
