use axum::{Router, routing::get};
use std::sync::Arc;

use agenda_db::BookingStore;

use crate::{ApiState, handlers::calendar};

pub fn routes<S: BookingStore>() -> Router<Arc<ApiState<S>>> {
    Router::new()
        .route(
            "/api/calendars",
            get(calendar::list_calendars::<S>).post(calendar::create_calendar::<S>),
        )
        .route("/api/calendars/:id", get(calendar::get_calendar::<S>))
        .route(
            "/api/calendars/:id/available",
            get(calendar::list_available::<S>),
        )
}
