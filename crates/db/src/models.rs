use agenda_core::models::{
    calendar::{Calendar, CalendarSummary},
    slot_instance::{Appointment, SlotInstance, SlotView},
    slot_template::SlotTemplate,
};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct DbSlotTemplate {
    pub id: Uuid,
    pub label: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbCalendar {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbCalendarSummary {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub available: i64,
    pub total: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbSlotInstance {
    pub id: Uuid,
    pub calendar_id: Uuid,
    pub slot_template_id: Uuid,
    pub holder_id: Option<Uuid>,
    pub reserved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbSlotView {
    pub slot_instance_id: Uuid,
    pub calendar_id: Uuid,
    pub slot_template_id: Uuid,
    pub slot_template_label: String,
    pub holder_id: Option<Uuid>,
    pub reserved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbAppointment {
    pub slot_instance_id: Uuid,
    pub calendar_id: Uuid,
    pub provider_id: Uuid,
    pub date: NaiveDate,
    pub slot_template_label: String,
    pub reserved_at: DateTime<Utc>,
}

impl From<DbSlotTemplate> for SlotTemplate {
    fn from(row: DbSlotTemplate) -> Self {
        Self {
            id: row.id,
            label: row.label,
            created_at: row.created_at,
        }
    }
}

impl From<DbCalendar> for Calendar {
    fn from(row: DbCalendar) -> Self {
        Self {
            id: row.id,
            provider_id: row.provider_id,
            date: row.date,
            created_at: row.created_at,
        }
    }
}

impl From<DbCalendarSummary> for CalendarSummary {
    fn from(row: DbCalendarSummary) -> Self {
        Self {
            calendar: Calendar {
                id: row.id,
                provider_id: row.provider_id,
                date: row.date,
                created_at: row.created_at,
            },
            available: row.available.max(0) as usize,
            total: row.total.max(0) as usize,
        }
    }
}

impl From<DbSlotInstance> for SlotInstance {
    fn from(row: DbSlotInstance) -> Self {
        Self {
            id: row.id,
            calendar_id: row.calendar_id,
            slot_template_id: row.slot_template_id,
            holder_id: row.holder_id,
            reserved_at: row.reserved_at,
        }
    }
}

impl From<DbSlotView> for SlotView {
    fn from(row: DbSlotView) -> Self {
        Self {
            slot_instance_id: row.slot_instance_id,
            calendar_id: row.calendar_id,
            slot_template_id: row.slot_template_id,
            slot_template_label: row.slot_template_label,
            holder_id: row.holder_id,
            reserved_at: row.reserved_at,
        }
    }
}

impl From<DbAppointment> for Appointment {
    fn from(row: DbAppointment) -> Self {
        Self {
            slot_instance_id: row.slot_instance_id,
            calendar_id: row.calendar_id,
            provider_id: row.provider_id,
            date: row.date,
            slot_template_label: row.slot_template_label,
            reserved_at: row.reserved_at,
        }
    }
}
