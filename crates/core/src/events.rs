use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Emitted by the booking service after a transaction commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BookingEvent {
    Confirmed {
        person_id: Uuid,
        calendar_id: Uuid,
        slot_instance_id: Uuid,
        slot_template_label: String,
        date: NaiveDate,
        reserved_at: DateTime<Utc>,
    },
    Cancelled {
        person_id: Uuid,
        calendar_id: Uuid,
        slot_instance_id: Uuid,
        slot_template_label: String,
        date: NaiveDate,
    },
    Rescheduled {
        person_id: Uuid,
        calendar_id: Uuid,
        from_slot_instance_id: Uuid,
        to_slot_instance_id: Uuid,
        from_label: String,
        to_label: String,
        date: NaiveDate,
        reserved_at: DateTime<Utc>,
    },
}

impl BookingEvent {
    pub fn person_id(&self) -> Uuid {
        match self {
            BookingEvent::Confirmed { person_id, .. }
            | BookingEvent::Cancelled { person_id, .. }
            | BookingEvent::Rescheduled { person_id, .. } => *person_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            BookingEvent::Confirmed { .. } => "confirmed",
            BookingEvent::Cancelled { .. } => "cancelled",
            BookingEvent::Rescheduled { .. } => "rescheduled",
        }
    }
}
