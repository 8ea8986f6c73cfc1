use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::services::seat_types;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/events/{id}/seat-types",
            get(list_seat_types).post(create_seat_type),
        )
        .route(
            "/events/{id}/seat-types/{seat_type_id}",
            patch(update_seat_type).delete(delete_seat_type),
        )
        .route("/events/{id}/assign-seats", post(assign_rectangle))
        .route("/events/{id}/seats/disable", patch(disable_seats))
        .route("/events/{id}/seats/enable", patch(enable_seats))
}

/* ---------- SEAT TYPE CATALOG ---------- */

// GET /api/events/{id}/seat-types
async fn list_seat_types(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let types = seat_types::list_seat_types(&state.db.pool, event_id).await?;
    Ok(Json(types))
}

#[derive(Debug, Deserialize)]
struct CreateSeatTypeRequest {
    name: String,
    price: f64,
}

// POST /api/events/{id}/seat-types
async fn create_seat_type(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(event_id): Path<Uuid>,
    Json(req): Json<CreateSeatTypeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let created =
        seat_types::create_seat_type(&state.db.pool, event_id, &user, &req.name, req.price)
            .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Debug, Deserialize)]
struct UpdateSeatTypeRequest {
    name: Option<String>,
    price: Option<f64>,
}

// PATCH /api/events/{id}/seat-types/{seat_type_id}
async fn update_seat_type(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path((event_id, seat_type_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateSeatTypeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let updated = seat_types::update_seat_type(
        &state.db.pool,
        event_id,
        seat_type_id,
        &user,
        req.name.as_deref(),
        req.price,
    )
    .await?;
    Ok(Json(updated))
}

// DELETE /api/events/{id}/seat-types/{seat_type_id}
async fn delete_seat_type(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path((event_id, seat_type_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    seat_types::delete_seat_type(&state.db.pool, event_id, seat_type_id, &user).await?;
    Ok(Json(json!({ "success": true })))
}

/* ---------- RECTANGLE ASSIGNMENT ---------- */

#[derive(Debug, Deserialize)]
struct AssignRectangleRequest {
    seat_type_name: String,
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
}

// POST /api/events/{id}/assign-seats
async fn assign_rectangle(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(event_id): Path<Uuid>,
    Json(req): Json<AssignRectangleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let updated = seat_types::assign_rectangle(
        &state.db.pool,
        event_id,
        &user,
        &req.seat_type_name,
        req.x1,
        req.y1,
        req.x2,
        req.y2,
    )
    .await?;
    Ok(Json(json!({ "success": true, "seats_updated": updated })))
}

/* ---------- DISABLE / ENABLE ---------- */

#[derive(Debug, Deserialize)]
struct ToggleSeatsRequest {
    seat_ids: Vec<Uuid>,
}

// PATCH /api/events/{id}/seats/disable
async fn disable_seats(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(event_id): Path<Uuid>,
    Json(req): Json<ToggleSeatsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let toggled =
        seat_types::disable_seats(&state.db.pool, event_id, &user, &req.seat_ids).await?;
    Ok(Json(json!({ "success": true, "seats_disabled": toggled })))
}

// PATCH /api/events/{id}/seats/enable
async fn enable_seats(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(event_id): Path<Uuid>,
    Json(req): Json<ToggleSeatsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let toggled =
        seat_types::enable_seats(&state.db.pool, event_id, &user, &req.seat_ids).await?;
    Ok(Json(json!({ "success": true, "seats_enabled": toggled })))
}
