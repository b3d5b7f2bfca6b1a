//! # Error Handling Middleware
//!
//! Maps [`BookingError`] to HTTP status codes and JSON error bodies so every
//! endpoint reports failures the same way:
//!
//! ```json
//! { "error": "Slot is no longer available, choose another slot", "code": "slot_unavailable" }
//! ```

use agenda_core::errors::BookingError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

/// Application error wrapper that provides HTTP status code mapping
///
/// `AppError` wraps a [`BookingError`] and implements `IntoResponse`, so
/// handlers can return `Result<_, AppError>` and use `?` on engine calls.
///
/// # Example
///
/// ```
/// use axum::Json;
/// use agenda_api::middleware::error_handling::AppError;
/// use agenda_core::errors::BookingError;
///
/// async fn handler(found: bool) -> Result<Json<&'static str>, AppError> {
///     if !found {
///         return Err(BookingError::NotFound("Calendar".into()).into());
///     }
///     Ok(Json("ok"))
/// }
/// # fn main() {}
/// ```
#[derive(Debug)]
pub struct AppError(pub BookingError);

impl AppError {
    /// The status code this error is reported with.
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            BookingError::Validation(_)
            | BookingError::SameSlot
            | BookingError::CalendarMismatch => StatusCode::BAD_REQUEST,
            BookingError::ExpiredCalendar | BookingError::ExpiredAppointment => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            BookingError::NotFound(_) => StatusCode::NOT_FOUND,
            BookingError::SlotUnavailable
            | BookingError::DuplicateBooking
            | BookingError::CalendarExists => StatusCode::CONFLICT,
            BookingError::NotOwner => StatusCode::FORBIDDEN,
            BookingError::Authentication(_) => StatusCode::UNAUTHORIZED,
            BookingError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            BookingError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Converts application errors to HTTP responses
///
/// Infrastructure failures are logged in full and reported to the client
/// with a generic message.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self.0 {
            BookingError::Database(report) => {
                error!("Request failed: {:?}", report);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        let body = Json(json!({ "error": message, "code": self.0.code() }));

        (status, body).into_response()
    }
}

/// Allows `?` on `BookingResult` inside handlers.
impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        AppError(err)
    }
}

/// Wraps storage failures in [`BookingError::Database`].
impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(BookingError::Database(err))
    }
}

/// Maps a [`BookingError`] straight to an HTTP response
pub fn map_error(err: BookingError) -> Response {
    AppError(err).into_response()
}
