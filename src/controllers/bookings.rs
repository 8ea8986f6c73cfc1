use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::seat_transaction::ACTION_BOOK;
use crate::models::{Payment, Ticket};
use crate::services::{booking, holds};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", post(create_booking))
        .route("/bookings/hold", post(hold_seats))
        .route("/bookings/release", post(release_seats))
        .route("/bookings/confirm", post(confirm_hold))
        .route("/tickets", get(my_tickets))
        .route("/tickets/{id}/refund", post(refund_ticket))
        .route("/payments/{id}", get(get_payment))
}

/* ---------- BOOKING ---------- */

#[derive(Debug, Deserialize)]
struct CreateBookingRequest {
    buyer_name: Option<String>,
    seat_ids: Vec<Uuid>,
}

// POST /api/bookings — direct purchase of AVAILABLE seats
async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let receipt =
        booking::book(&state.db.pool, req.buyer_name.as_deref(), &req.seat_ids).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/* ---------- HOLDS ---------- */

#[derive(Debug, Deserialize)]
struct HoldRequest {
    seat_ids: Vec<Uuid>,
    ttl_seconds: Option<i64>,
}

// POST /api/bookings/hold
async fn hold_seats(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<HoldRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ttl = req
        .ttl_seconds
        .unwrap_or(state.config.holds.default_ttl_seconds);

    holds::hold_seats(&state.db.pool, user.user_id, &req.seat_ids, ttl).await?;

    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
struct ReleaseRequest {
    seat_ids: Vec<Uuid>,
}

// POST /api/bookings/release — give up the caller's own holds early
async fn release_seats(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<ReleaseRequest>,
) -> Result<impl IntoResponse, AppError> {
    let released = holds::release_seats(&state.db.pool, user.user_id, &req.seat_ids).await?;
    Ok(Json(json!({ "success": true, "seats_released": released })))
}

#[derive(Debug, Deserialize)]
struct ConfirmRequest {
    seat_ids: Vec<Uuid>,
    amount: f64,
}

// POST /api/bookings/confirm — convert the caller's holds into tickets
async fn confirm_hold(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<ConfirmRequest>,
) -> Result<impl IntoResponse, AppError> {
    let receipt =
        booking::confirm_hold(&state.db.pool, user.user_id, &req.seat_ids, req.amount).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/* ---------- TICKETS ---------- */

// GET /api/tickets
async fn my_tickets(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let tickets = booking::purchased_tickets(&state.db.pool, user.user_id).await?;
    Ok(Json(tickets))
}

// GET /api/payments/{id} — receipt lookup: the payment and its tickets
async fn get_payment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(payment_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let payment = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1")
        .bind(payment_id)
        .fetch_optional(&state.db.pool)
        .await?
        .ok_or(AppError::TicketNotFound)?;

    // The payment row carries no buyer; ownership is established through
    // the BOOK audit rows of its tickets.
    if !user.is_admin {
        let mine = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(
                 SELECT 1 FROM seat_transactions tr
                 JOIN tickets t ON t.id = tr.ticket_id
                 WHERE t.payment_id = $1 AND tr.user_id = $2 AND tr.action = $3
             )",
        )
        .bind(payment_id)
        .bind(user.user_id)
        .bind(ACTION_BOOK)
        .fetch_one(&state.db.pool)
        .await?;
        if !mine {
            return Err(AppError::NotAuthorized);
        }
    }

    let tickets = sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE payment_id = $1")
        .bind(payment_id)
        .fetch_all(&state.db.pool)
        .await?;

    Ok(Json(json!({ "payment": payment, "tickets": tickets })))
}

// POST /api/tickets/{id}/refund
async fn refund_ticket(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(ticket_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    booking::refund(&state.db.pool, ticket_id, &user).await?;
    Ok(Json(json!({ "success": true })))
}
