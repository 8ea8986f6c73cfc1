use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{Event, EventStatus, SeatStatus, SeatType};
use crate::services::dedup_ids;

/// Inclusive rectangle with corners in canonical order. Callers may
/// submit the corners in any order.
pub fn normalize_rect(x1: i32, y1: i32, x2: i32, y2: i32) -> (i32, i32, i32, i32) {
    (x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2))
}

/// Locks the event row and checks that pricing may still change.
/// PUBLISHED events are locked to protect already-sold pricing;
/// CANCELLED events reject everything.
async fn event_for_pricing(
    tx: &mut Transaction<'_, Postgres>,
    event_id: Uuid,
    caller: &AuthUser,
) -> Result<Event> {
    let event: Event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1 FOR UPDATE")
        .bind(event_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(AppError::EventNotFound)?;

    if !caller.is_admin && event.organizer_id != caller.user_id {
        return Err(AppError::NotAuthorized);
    }

    match event.status.parse::<EventStatus>() {
        Ok(EventStatus::Cancelled) => Err(AppError::EventCancelled),
        Ok(s) if !s.pricing_mutable() => Err(AppError::EventLocked),
        _ => Ok(event),
    }
}

pub async fn list_seat_types(pool: &PgPool, event_id: Uuid) -> Result<Vec<SeatType>> {
    let types = sqlx::query_as::<_, SeatType>(
        "SELECT * FROM seat_types WHERE event_id = $1 ORDER BY is_default DESC, name",
    )
    .bind(event_id)
    .fetch_all(pool)
    .await?;
    Ok(types)
}

pub async fn create_seat_type(
    pool: &PgPool,
    event_id: Uuid,
    caller: &AuthUser,
    name: &str,
    price: f64,
) -> Result<SeatType> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }
    if price < 0.0 {
        return Err(AppError::Validation("price must not be negative".to_string()));
    }

    let mut tx = pool.begin().await?;
    event_for_pricing(&mut tx, event_id, caller).await?;

    let created = sqlx::query_as::<_, SeatType>(
        "INSERT INTO seat_types (event_id, name, price) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(event_id)
    .bind(name)
    .bind(price)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| match e.as_database_error() {
        Some(db) if db.is_unique_violation() => {
            AppError::Validation(format!("seat type '{name}' already exists"))
        }
        _ => AppError::Database(e),
    })?;

    tx.commit().await?;
    Ok(created)
}

pub async fn update_seat_type(
    pool: &PgPool,
    event_id: Uuid,
    seat_type_id: Uuid,
    caller: &AuthUser,
    name: Option<&str>,
    price: Option<f64>,
) -> Result<SeatType> {
    if let Some(p) = price {
        if p < 0.0 {
            return Err(AppError::Validation("price must not be negative".to_string()));
        }
    }

    let mut tx = pool.begin().await?;
    event_for_pricing(&mut tx, event_id, caller).await?;

    // Already-issued tickets keep their snapshotted price regardless.
    let updated: Option<SeatType> = sqlx::query_as::<_, SeatType>(
        "UPDATE seat_types
         SET name = COALESCE($1, name), price = COALESCE($2, price)
         WHERE id = $3 AND event_id = $4
         RETURNING *",
    )
    .bind(name)
    .bind(price)
    .bind(seat_type_id)
    .bind(event_id)
    .fetch_optional(&mut *tx)
    .await?;

    let updated = updated.ok_or_else(|| AppError::SeatTypeNotFound(seat_type_id.to_string()))?;
    tx.commit().await?;
    Ok(updated)
}

/// Deleting a tier reassigns its seats to the default tier first, in the
/// same transaction, so no seat is ever left pointing at a missing tier.
/// The default tier itself is not deletable.
pub async fn delete_seat_type(
    pool: &PgPool,
    event_id: Uuid,
    seat_type_id: Uuid,
    caller: &AuthUser,
) -> Result<()> {
    let mut tx = pool.begin().await?;
    event_for_pricing(&mut tx, event_id, caller).await?;

    let target: Option<SeatType> = sqlx::query_as::<_, SeatType>(
        "SELECT * FROM seat_types WHERE id = $1 AND event_id = $2 FOR UPDATE",
    )
    .bind(seat_type_id)
    .bind(event_id)
    .fetch_optional(&mut *tx)
    .await?;

    let target = target.ok_or_else(|| AppError::SeatTypeNotFound(seat_type_id.to_string()))?;
    if target.is_default {
        return Err(AppError::CannotDeleteDefault);
    }

    let default_id = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM seat_types WHERE event_id = $1 AND is_default",
    )
    .bind(event_id)
    .fetch_one(&mut *tx)
    .await?;

    let reassigned = sqlx::query("UPDATE seats SET seat_type_id = $1 WHERE seat_type_id = $2")
        .bind(default_id)
        .bind(seat_type_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    sqlx::query("DELETE FROM seat_types WHERE id = $1")
        .bind(seat_type_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!(event = %event_id, seat_type = %target.name, reassigned, "seat type deleted");
    Ok(())
}

/// Stamps a pricing tier across the inclusive rectangle. One bulk update;
/// coordinates beyond the grid simply match no seats.
pub async fn assign_rectangle(
    pool: &PgPool,
    event_id: Uuid,
    caller: &AuthUser,
    seat_type_name: &str,
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
) -> Result<u64> {
    let (x_lo, y_lo, x_hi, y_hi) = normalize_rect(x1, y1, x2, y2);

    let mut tx = pool.begin().await?;
    event_for_pricing(&mut tx, event_id, caller).await?;

    let seat_type_id = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM seat_types WHERE event_id = $1 AND name = $2",
    )
    .bind(event_id)
    .bind(seat_type_name)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::SeatTypeNotFound(seat_type_name.to_string()))?;

    let updated = sqlx::query(
        "UPDATE seats
         SET seat_type_id = $1
         WHERE event_id = $2 AND x BETWEEN $3 AND $4 AND y BETWEEN $5 AND $6",
    )
    .bind(seat_type_id)
    .bind(event_id)
    .bind(x_lo)
    .bind(x_hi)
    .bind(y_lo)
    .bind(y_hi)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    tx.commit().await?;

    info!(
        event = %event_id,
        seat_type = seat_type_name,
        rect = ?(x_lo, y_lo, x_hi, y_hi),
        updated,
        "rectangle assigned"
    );
    Ok(updated)
}

/// Takes AVAILABLE seats out of sale. Only AVAILABLE seats match the
/// predicate; held and booked seats are left alone.
pub async fn disable_seats(
    pool: &PgPool,
    event_id: Uuid,
    caller: &AuthUser,
    seat_ids: &[Uuid],
) -> Result<u64> {
    toggle_seats(
        pool,
        event_id,
        caller,
        seat_ids,
        SeatStatus::Available,
        SeatStatus::Disabled,
    )
    .await
}

/// Puts DISABLED seats back on sale.
pub async fn enable_seats(
    pool: &PgPool,
    event_id: Uuid,
    caller: &AuthUser,
    seat_ids: &[Uuid],
) -> Result<u64> {
    toggle_seats(
        pool,
        event_id,
        caller,
        seat_ids,
        SeatStatus::Disabled,
        SeatStatus::Available,
    )
    .await
}

async fn toggle_seats(
    pool: &PgPool,
    event_id: Uuid,
    caller: &AuthUser,
    seat_ids: &[Uuid],
    from: SeatStatus,
    to: SeatStatus,
) -> Result<u64> {
    debug_assert!(from.can_become(to));
    if seat_ids.is_empty() {
        return Err(AppError::Validation("no seats selected".to_string()));
    }

    let ids = dedup_ids(seat_ids);
    let mut tx = pool.begin().await?;

    let event: Event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1 FOR UPDATE")
        .bind(event_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::EventNotFound)?;

    if !caller.is_admin && event.organizer_id != caller.user_id {
        return Err(AppError::NotAuthorized);
    }
    if event.status.parse::<EventStatus>() == Ok(EventStatus::Cancelled) {
        return Err(AppError::EventCancelled);
    }

    let toggled = sqlx::query(
        "UPDATE seats SET status = $1
         WHERE event_id = $2 AND id = ANY($3) AND status = $4",
    )
    .bind(to.as_str())
    .bind(event_id)
    .bind(&ids)
    .bind(from.as_str())
    .execute(&mut *tx)
    .await?
    .rows_affected();

    tx.commit().await?;

    info!(event = %event_id, toggled, to = %to, "seats toggled");
    Ok(toggled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rectangle_corners_normalize_in_any_order() {
        assert_eq!(normalize_rect(1, 1, 2, 3), (1, 1, 2, 3));
        assert_eq!(normalize_rect(2, 1, 1, 3), (1, 1, 2, 3));
        assert_eq!(normalize_rect(2, 3, 1, 1), (1, 1, 2, 3));
        assert_eq!(normalize_rect(1, 3, 2, 1), (1, 1, 2, 3));
    }

    #[test]
    fn degenerate_rectangle_is_a_single_cell() {
        assert_eq!(normalize_rect(4, 7, 4, 7), (4, 7, 4, 7));
    }

    proptest! {
        #[test]
        fn normalization_is_order_independent(x1 in -100i32..100, y1 in -100i32..100,
                                              x2 in -100i32..100, y2 in -100i32..100) {
            let a = normalize_rect(x1, y1, x2, y2);
            let b = normalize_rect(x2, y2, x1, y1);
            prop_assert_eq!(a, b);
            prop_assert!(a.0 <= a.2 && a.1 <= a.3);
        }
    }
}
