use std::sync::Arc;

use agenda_core::models::slot_instance::{Appointment, Page};
use agenda_db::BookingStore;
use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::{
    ApiState,
    middleware::{error_handling::AppError, identity::Caller},
};

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
}

pub async fn appointments<S: BookingStore>(
    State(state): State<Arc<ApiState<S>>>,
    Caller(person_id): Caller,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Appointment>>, AppError> {
    let page = query.page.unwrap_or(1).max(1) as usize;
    Ok(Json(state.booking.appointments_for(person_id, page).await?))
}
