use agenda_api::middleware::error_handling::{AppError, map_error};
use agenda_core::errors::BookingError;
use axum::http::StatusCode;
use rstest::rstest;
use serde_json::Value;
use uuid::Uuid;

use crate::test_utils::{TestContext, as_person};

#[rstest]
#[case::validation(BookingError::Validation("bad".into()), StatusCode::BAD_REQUEST)]
#[case::calendar_mismatch(BookingError::CalendarMismatch, StatusCode::BAD_REQUEST)]
#[case::expired_calendar(BookingError::ExpiredCalendar, StatusCode::UNPROCESSABLE_ENTITY)]
#[case::expired_appointment(BookingError::ExpiredAppointment, StatusCode::UNPROCESSABLE_ENTITY)]
#[case::not_found(BookingError::NotFound("Calendar".into()), StatusCode::NOT_FOUND)]
#[case::slot_unavailable(BookingError::SlotUnavailable, StatusCode::CONFLICT)]
#[case::duplicate(BookingError::DuplicateBooking, StatusCode::CONFLICT)]
#[case::calendar_exists(BookingError::CalendarExists, StatusCode::CONFLICT)]
#[case::not_owner(BookingError::NotOwner, StatusCode::FORBIDDEN)]
#[case::authentication(BookingError::Authentication("who".into()), StatusCode::UNAUTHORIZED)]
#[case::rate_limited(BookingError::RateLimited("slow".into()), StatusCode::TOO_MANY_REQUESTS)]
#[case::database(BookingError::Database(eyre::eyre!("connection reset")), StatusCode::INTERNAL_SERVER_ERROR)]
fn test_error_status_mapping(#[case] error: BookingError, #[case] expected: StatusCode) {
    assert_eq!(AppError(error).status(), expected);
}

#[test]
fn test_map_error_response() {
    let response = map_error(BookingError::SlotUnavailable);
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_database_error_details_are_hidden() {
    let report: AppError = eyre::eyre!("password authentication failed for user").into();
    let response = axum::response::IntoResponse::into_response(report);
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"], "Internal server error");
    assert_eq!(body["code"], "database");
}

#[tokio::test]
async fn test_malformed_identity_is_unauthorized() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .get("/api/me/appointments")
        .add_header(
            axum::http::HeaderName::from_static("x-person-id"),
            axum::http::HeaderValue::from_static("not-a-uuid"),
        )
        .expect_failure()
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_and_version() {
    let ctx = TestContext::new().await;

    let health: Value = ctx.server.get("/health").await.json();
    assert_eq!(health["status"], "ok");

    let version: Value = as_person(ctx.server.get("/version"), Uuid::new_v4())
        .await
        .json();
    assert_eq!(version["version"], env!("CARGO_PKG_VERSION"));
}
