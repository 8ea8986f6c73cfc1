use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::{Event, EventStatus, Seat, SeatTransaction};
use crate::services::{grid, lifecycle};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route("/events/{id}", get(get_event))
        .route("/events/{id}/status", patch(update_status))
        .route("/events/{id}/seats", get(list_seats))
        .route("/events/{id}/seat-map", get(seat_map))
        .route("/events/{id}/transactions", get(list_transactions))
}

/* ---------- EVENTS ---------- */

#[derive(Debug, Deserialize)]
struct CreateEventRequest {
    name: String,
    address: Option<String>,
    event_date: DateTime<Utc>,
    rows: i32,
    columns: i32,
    default_price: Option<f64>,
}

// POST /api/events
async fn create_event(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    let event = lifecycle::create_event(
        &state.db.pool,
        user.user_id,
        lifecycle::NewEvent {
            name: req.name,
            address: req.address,
            event_date: req.event_date,
            rows: req.rows,
            columns: req.columns,
            default_price: req.default_price.unwrap_or(0.0),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(event)))
}

// GET /api/events
async fn list_events(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let events = sqlx::query_as::<_, Event>("SELECT * FROM events ORDER BY event_date")
        .fetch_all(&state.db.pool)
        .await?;
    Ok(Json(events))
}

// GET /api/events/{id}
async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db.pool)
        .await?
        .ok_or(AppError::EventNotFound)?;
    Ok(Json(event))
}

/* ---------- LIFECYCLE ---------- */

#[derive(Debug, Deserialize)]
struct UpdateStatusRequest {
    status: String,
}

// PATCH /api/events/{id}/status
async fn update_status(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let next: EventStatus = req
        .status
        .parse()
        .map_err(AppError::Validation)?;

    let event = lifecycle::transition(&state.db.pool, id, next, &user).await?;

    Ok(Json(json!({ "success": true, "event": event })))
}

/* ---------- SEATS ---------- */

// GET /api/events/{id}/seats — raw seat rows, without pricing
async fn list_seats(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let seats = sqlx::query_as::<_, Seat>(
        "SELECT * FROM seats WHERE event_id = $1 ORDER BY y, x",
    )
    .bind(id)
    .fetch_all(&state.db.pool)
    .await?;
    Ok(Json(seats))
}

// GET /api/events/{id}/transactions — audit trail, organizer or admin only
async fn list_transactions(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db.pool)
        .await?
        .ok_or(AppError::EventNotFound)?;

    if !user.is_admin && event.organizer_id != user.user_id {
        return Err(AppError::NotAuthorized);
    }

    let log = sqlx::query_as::<_, SeatTransaction>(
        "SELECT tr.* FROM seat_transactions tr
         JOIN seats s ON s.id = tr.seat_id
         WHERE s.event_id = $1
         ORDER BY tr.created_at",
    )
    .bind(id)
    .fetch_all(&state.db.pool)
    .await?;

    Ok(Json(log))
}

/* ---------- SEAT MAP ---------- */

// GET /api/events/{id}/seat-map
async fn seat_map(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let seats = grid::list_seat_map(&state.db.pool, id).await?;
    Ok(Json(seats))
}
