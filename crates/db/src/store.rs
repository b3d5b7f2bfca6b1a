//! The storage seam used by the booking engine.
//!
//! Reads on [`BookingStore`] take no locks and may be stale. Anything that
//! decides whether a write is allowed must be re-read inside a
//! [`StoreTransaction`] after the relevant rows are locked.

use agenda_core::models::{
    calendar::{Calendar, CalendarSummary},
    slot_instance::{Appointment, SlotInstance, SlotView},
    slot_template::SlotTemplate,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use eyre::Result;
use uuid::Uuid;

/// Result of trying to make a person the holder of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldOutcome {
    Claimed,
    /// The person already holds another slot in the same calendar.
    HolderConflict,
}

#[async_trait]
pub trait BookingStore: Send + Sync + 'static {
    type Tx: StoreTransaction;

    async fn begin(&self) -> Result<Self::Tx>;

    /// Inserts a template, or returns the existing one with the same label.
    async fn insert_template(&self, label: &str) -> Result<SlotTemplate>;
    async fn get_template(&self, id: Uuid) -> Result<Option<SlotTemplate>>;
    async fn list_templates(&self) -> Result<Vec<SlotTemplate>>;

    async fn get_calendar(&self, id: Uuid) -> Result<Option<Calendar>>;
    async fn find_calendar(&self, provider_id: Uuid, date: NaiveDate) -> Result<Option<Calendar>>;
    /// Calendars dated `from` or later, ordered by date then provider.
    async fn list_calendars_from(
        &self,
        from: NaiveDate,
        provider_id: Option<Uuid>,
    ) -> Result<Vec<CalendarSummary>>;

    async fn get_slot(&self, id: Uuid) -> Result<Option<SlotInstance>>;
    async fn find_hold(&self, calendar_id: Uuid, person_id: Uuid) -> Result<Option<SlotInstance>>;
    /// All slots of a calendar, ordered by label.
    async fn list_slots(&self, calendar_id: Uuid) -> Result<Vec<SlotView>>;
    /// Every slot a person holds, ordered by date then label.
    async fn list_holds(&self, person_id: Uuid) -> Result<Vec<Appointment>>;
}

/// A unit of work. Dropping it without calling [`commit`](Self::commit)
/// rolls back every write and releases every lock it took.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Locks the slot binding `slot_template_id` to `calendar_id`, blocking
    /// while another transaction holds it.
    async fn lock_slot(
        &mut self,
        calendar_id: Uuid,
        slot_template_id: Uuid,
    ) -> Result<Option<SlotInstance>>;

    /// Locks several slots in ascending id order. Missing ids are skipped.
    async fn lock_slots(&mut self, ids: &[Uuid]) -> Result<Vec<SlotInstance>>;

    /// The slot `person_id` holds in `calendar_id`, as seen by this transaction.
    async fn hold_in_calendar(&mut self, calendar_id: Uuid, person_id: Uuid) -> Result<Option<Uuid>>;

    /// Sets the holder of a slot locked by this transaction.
    async fn set_holder(
        &mut self,
        slot_id: Uuid,
        person_id: Uuid,
        reserved_at: DateTime<Utc>,
    ) -> Result<HoldOutcome>;

    /// Frees a slot locked by this transaction.
    async fn clear_holder(&mut self, slot_id: Uuid) -> Result<()>;

    /// Returns `None` when the provider already has a calendar on `date`.
    async fn insert_calendar(&mut self, provider_id: Uuid, date: NaiveDate) -> Result<Option<Calendar>>;

    /// Returns `None` when the calendar already binds that template.
    async fn insert_slot(
        &mut self,
        calendar_id: Uuid,
        slot_template_id: Uuid,
    ) -> Result<Option<SlotInstance>>;

    async fn commit(self) -> Result<()>;
}
