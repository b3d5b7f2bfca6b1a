use std::sync::Arc;

use agenda_core::models::slot_template::{CreateSlotTemplateRequest, SlotTemplate};
use agenda_db::BookingStore;
use axum::{Json, extract::State, http::StatusCode};

use crate::{ApiState, middleware::error_handling::AppError};

pub async fn list_templates<S: BookingStore>(
    State(state): State<Arc<ApiState<S>>>,
) -> Result<Json<Vec<SlotTemplate>>, AppError> {
    Ok(Json(state.booking.list_templates().await?))
}

pub async fn create_template<S: BookingStore>(
    State(state): State<Arc<ApiState<S>>>,
    Json(payload): Json<CreateSlotTemplateRequest>,
) -> Result<(StatusCode, Json<SlotTemplate>), AppError> {
    let template = state.booking.register_template(&payload.label).await?;
    Ok((StatusCode::CREATED, Json(template)))
}
