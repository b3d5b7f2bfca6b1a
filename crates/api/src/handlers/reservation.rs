use std::sync::Arc;

use agenda_core::models::slot_instance::{ModifyRequest, Receipt, Reservation, ReserveRequest};
use agenda_db::BookingStore;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use super::throttle;
use crate::{
    ApiState,
    middleware::{error_handling::AppError, identity::Caller},
};

pub async fn reserve<S: BookingStore>(
    State(state): State<Arc<ApiState<S>>>,
    Path(calendar_id): Path<Uuid>,
    Caller(person_id): Caller,
    Json(payload): Json<ReserveRequest>,
) -> Result<(StatusCode, Json<Reservation>), AppError> {
    throttle(&state, "reserve", person_id)?;

    let reservation = state
        .booking
        .reserve(calendar_id, payload.slot_template_id, person_id)
        .await?;

    Ok((StatusCode::CREATED, Json(reservation)))
}

pub async fn cancel<S: BookingStore>(
    State(state): State<Arc<ApiState<S>>>,
    Path(slot_instance_id): Path<Uuid>,
    Caller(person_id): Caller,
) -> Result<StatusCode, AppError> {
    throttle(&state, "cancel", person_id)?;

    state.booking.cancel(slot_instance_id, person_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn modify<S: BookingStore>(
    State(state): State<Arc<ApiState<S>>>,
    Path(slot_instance_id): Path<Uuid>,
    Caller(person_id): Caller,
    Json(payload): Json<ModifyRequest>,
) -> Result<Json<Reservation>, AppError> {
    throttle(&state, "modify", person_id)?;

    let reservation = state
        .booking
        .modify(slot_instance_id, payload.new_slot_instance_id, person_id)
        .await?;

    Ok(Json(reservation))
}

pub async fn receipt<S: BookingStore>(
    State(state): State<Arc<ApiState<S>>>,
    Path(calendar_id): Path<Uuid>,
    Caller(person_id): Caller,
) -> Result<Json<Receipt>, AppError> {
    Ok(Json(state.booking.receipt(calendar_id, person_id).await?))
}
