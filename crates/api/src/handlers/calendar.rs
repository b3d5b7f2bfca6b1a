use std::sync::Arc;

use agenda_core::models::{
    calendar::{CalendarCreated, CalendarDetail, CalendarSummary, CreateCalendarRequest},
    slot_instance::AvailableSlot,
};
use agenda_db::BookingStore;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiState, middleware::error_handling::AppError};

#[derive(Debug, Deserialize)]
pub struct UpcomingQuery {
    pub provider_id: Option<Uuid>,
}

pub async fn create_calendar<S: BookingStore>(
    State(state): State<Arc<ApiState<S>>>,
    Json(payload): Json<CreateCalendarRequest>,
) -> Result<(StatusCode, Json<CalendarCreated>), AppError> {
    let created = state
        .booking
        .create_calendar_with_slots(payload.provider_id, payload.date, &payload.slot_template_ids)
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_calendars<S: BookingStore>(
    State(state): State<Arc<ApiState<S>>>,
    Query(query): Query<UpcomingQuery>,
) -> Result<Json<Vec<CalendarSummary>>, AppError> {
    Ok(Json(state.booking.upcoming_calendars(query.provider_id).await?))
}

pub async fn get_calendar<S: BookingStore>(
    State(state): State<Arc<ApiState<S>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<CalendarDetail>, AppError> {
    Ok(Json(state.booking.calendar_detail(id).await?))
}

/// Free slots of a calendar. The list is read without locks and may already
/// be stale when it reaches the client.
pub async fn list_available<S: BookingStore>(
    State(state): State<Arc<ApiState<S>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<AvailableSlot>>, AppError> {
    Ok(Json(state.booking.list_available(id).await?))
}
