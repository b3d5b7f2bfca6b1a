//! # Agenda booking engine
//!
//! Reservation, cancellation and rescheduling of provider slots under
//! contention. Every write follows the same protocol:
//!
//! 1. cheap advisory checks through [`guard::ValidationGuard`], without locks;
//! 2. a transaction that locks the affected slot rows and re-validates the
//!    state it is about to change;
//! 3. commit, and only then publication of a [`BookingEvent`] on the
//!    [`events::EventBus`].
//!
//! [`BookingEvent`]: agenda_core::events::BookingEvent

pub mod events;
pub mod guard;
pub mod service;

pub use events::{EventBus, EventHandler, LoggingHandler};
pub use guard::ValidationGuard;
pub use service::{BookingService, DEFAULT_PAGE_SIZE};
