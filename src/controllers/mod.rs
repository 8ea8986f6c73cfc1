pub mod bookings;
pub mod events;
pub mod seat_types;

use axum::Router;
use std::sync::Arc;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(events::routes())
        .merge(seat_types::routes())
        .merge(bookings::routes())
}
