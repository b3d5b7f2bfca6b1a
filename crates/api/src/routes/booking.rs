use axum::{
    Router,
    routing::{delete, get, post},
};
use std::sync::Arc;

use agenda_db::BookingStore;

use crate::{
    ApiState,
    handlers::{me, reservation},
};

/// Endpoints acting on behalf of the calling person.
pub fn routes<S: BookingStore>() -> Router<Arc<ApiState<S>>> {
    Router::new()
        .route(
            "/api/calendars/:id/reservations",
            post(reservation::reserve::<S>),
        )
        .route("/api/calendars/:id/receipt", get(reservation::receipt::<S>))
        .route(
            "/api/slots/:id/reservation",
            delete(reservation::cancel::<S>).put(reservation::modify::<S>),
        )
        .route("/api/me/appointments", get(me::appointments::<S>))
}
