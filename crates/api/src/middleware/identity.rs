//! # Caller identity
//!
//! Resolves the authenticated person behind a request. The upstream gateway
//! puts the person's id in the `x-person-id` header; requests without a valid
//! id are rejected with `401 Unauthorized` before any handler runs.

use agenda_core::errors::BookingError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use super::error_handling::AppError;

/// Header carrying the caller's person id.
pub const PERSON_HEADER: &str = "x-person-id";

/// The person making the request.
///
/// # Example
///
/// ```
/// use agenda_api::middleware::identity::Caller;
///
/// async fn whoami(Caller(person_id): Caller) -> String {
///     person_id.to_string()
/// }
/// # fn main() {}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(PERSON_HEADER)
            .ok_or_else(|| BookingError::Authentication("Missing caller identity".to_string()))?;

        raw.to_str()
            .ok()
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .map(Caller)
            .ok_or_else(|| {
                AppError(BookingError::Authentication(
                    "Malformed caller identity".to_string(),
                ))
            })
    }
}
