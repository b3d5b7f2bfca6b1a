use thiserror::Error;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Calendar date has already passed")]
    ExpiredCalendar,

    #[error("Appointment date has already passed")]
    ExpiredAppointment,

    #[error("Person already holds a slot in this calendar")]
    DuplicateBooking,

    #[error("Slot is no longer available, choose another slot")]
    SlotUnavailable,

    #[error("Slot is not held by the caller")]
    NotOwner,

    #[error("Provider already has a calendar for this date")]
    CalendarExists,

    #[error("New slot is the slot already held")]
    SameSlot,

    #[error("Slots belong to different calendars")]
    CalendarMismatch,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Database error: {0}")]
    Database(#[from] eyre::Report),
}

/// How a caller is expected to react to a [`BookingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad input; safe to retry once corrected.
    Validation,
    /// Lost a race for a slot; pick another one.
    Contention,
    /// The caller acted on somebody else's booking.
    Ownership,
    Infrastructure,
}

impl BookingError {
    pub fn class(&self) -> ErrorClass {
        match self {
            BookingError::SlotUnavailable => ErrorClass::Contention,
            BookingError::NotOwner => ErrorClass::Ownership,
            BookingError::Database(_) => ErrorClass::Infrastructure,
            _ => ErrorClass::Validation,
        }
    }

    /// Stable machine-readable name, used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            BookingError::ExpiredCalendar => "expired_calendar",
            BookingError::ExpiredAppointment => "expired_appointment",
            BookingError::DuplicateBooking => "duplicate_booking",
            BookingError::SlotUnavailable => "slot_unavailable",
            BookingError::NotOwner => "not_owner",
            BookingError::CalendarExists => "calendar_exists",
            BookingError::SameSlot => "same_slot",
            BookingError::CalendarMismatch => "calendar_mismatch",
            BookingError::NotFound(_) => "not_found",
            BookingError::Validation(_) => "validation",
            BookingError::Authentication(_) => "authentication",
            BookingError::RateLimited(_) => "rate_limited",
            BookingError::Database(_) => "database",
        }
    }
}

pub type BookingResult<T> = Result<T, BookingError>;
