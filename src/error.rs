use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Business outcomes are surfaced verbatim to the caller; only
/// infrastructure failures collapse into a generic 500.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("seats are not available: {0:?}")]
    SeatUnavailable(Vec<Uuid>),

    #[error("some requested seats do not exist")]
    SeatsNotFound,

    #[error("amount mismatch: expected {expected}, got {provided}")]
    AmountMismatch { expected: f64, provided: f64 },

    #[error("seat type '{0}' not found")]
    SeatTypeNotFound(String),

    #[error("the default seat type cannot be deleted")]
    CannotDeleteDefault,

    #[error("event is published; pricing can no longer change")]
    EventLocked,

    #[error("event is cancelled")]
    EventCancelled,

    #[error("event not found")]
    EventNotFound,

    #[error("ticket not found")]
    TicketNotFound,

    #[error("not authorized")]
    NotAuthorized,

    #[error("ticket already refunded")]
    AlreadyRefunded,

    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            // The UI needs the exact ids to deselect.
            AppError::SeatUnavailable(ids) => json!({
                "error": "seat_unavailable",
                "message": self.to_string(),
                "unavailable": ids,
            }),
            AppError::Database(e) => {
                tracing::error!("database error: {:?}", e);
                json!({ "error": "internal", "message": "try again" })
            }
            AppError::Internal(e) => {
                tracing::error!("internal error: {:?}", e);
                json!({ "error": "internal", "message": "try again" })
            }
            other => json!({
                "error": other.kind(),
                "message": other.to_string(),
            }),
        };

        (status, Json(body)).into_response()
    }
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::SeatUnavailable(_)
            | AppError::AmountMismatch { .. }
            | AppError::CannotDeleteDefault
            | AppError::EventLocked
            | AppError::EventCancelled
            | AppError::AlreadyRefunded
            | AppError::InvalidTransition { .. } => StatusCode::CONFLICT,
            AppError::SeatsNotFound
            | AppError::SeatTypeNotFound(_)
            | AppError::EventNotFound
            | AppError::TicketNotFound => StatusCode::NOT_FOUND,
            AppError::NotAuthorized => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AppError::SeatUnavailable(_) => "seat_unavailable",
            AppError::SeatsNotFound => "seats_not_found",
            AppError::AmountMismatch { .. } => "amount_mismatch",
            AppError::SeatTypeNotFound(_) => "seat_type_not_found",
            AppError::CannotDeleteDefault => "cannot_delete_default",
            AppError::EventLocked => "event_locked",
            AppError::EventCancelled => "event_cancelled",
            AppError::EventNotFound => "event_not_found",
            AppError::TicketNotFound => "ticket_not_found",
            AppError::NotAuthorized => "not_authorized",
            AppError::AlreadyRefunded => "already_refunded",
            AppError::InvalidTransition { .. } => "invalid_transition",
            AppError::Validation(_) => "validation",
            AppError::Database(_) | AppError::Internal(_) => "internal",
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_errors_map_to_conflict() {
        assert_eq!(
            AppError::SeatUnavailable(vec![]).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(AppError::EventLocked.status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::AlreadyRefunded.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn lookup_errors_map_to_not_found() {
        assert_eq!(AppError::SeatsNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::TicketNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::SeatTypeNotFound("vip".into()).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn infrastructure_errors_hide_details() {
        let err = AppError::Database(sqlx::Error::PoolTimedOut);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.kind(), "internal");
    }
}
