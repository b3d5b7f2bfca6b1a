pub mod calendar;
pub mod me;
pub mod reservation;
pub mod slot_template;

use agenda_core::errors::BookingError;
use agenda_db::BookingStore;
use uuid::Uuid;

use crate::{ApiState, middleware::error_handling::AppError};

/// Rejects the request with `429` once `person_id` has used up its booking
/// writes for the current window.
pub(crate) fn throttle<S: BookingStore>(
    state: &ApiState<S>,
    operation: &str,
    person_id: Uuid,
) -> Result<(), AppError> {
    if state.rate_limiter.allow(&format!("{}:{}", operation, person_id)) {
        Ok(())
    } else {
        Err(BookingError::RateLimited(format!("Too many {} requests, try again later", operation)).into())
    }
}
