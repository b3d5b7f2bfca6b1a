use axum::{Router, routing::get};
use std::sync::Arc;

use agenda_db::BookingStore;

use crate::{ApiState, handlers::slot_template};

pub fn routes<S: BookingStore>() -> Router<Arc<ApiState<S>>> {
    Router::new().route(
        "/api/slot-templates",
        get(slot_template::list_templates::<S>).post(slot_template::create_template::<S>),
    )
}
