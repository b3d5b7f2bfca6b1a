use std::sync::Arc;

use agenda_core::{
    clock::Clock,
    errors::{BookingError, BookingResult},
    events::BookingEvent,
    models::{
        calendar::{Calendar, CalendarCreated, CalendarDetail, CalendarSummary},
        slot_instance::{AvailableSlot, Appointment, Page, Receipt, Reservation, SlotInstance},
        slot_template::{SlotTemplate, is_catalog_label},
    },
};
use agenda_db::{BookingStore, HoldOutcome, StoreTransaction};
use chrono::NaiveDate;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{events::EventBus, guard::ValidationGuard};

/// Appointments shown per page in a person's area.
pub const DEFAULT_PAGE_SIZE: usize = 5;

const OWNERSHIP_TARGET: &str = "agenda::ownership";

/// Owns the reservation protocol over a [`BookingStore`].
pub struct BookingService<S> {
    store: S,
    clock: Arc<dyn Clock>,
    events: EventBus,
}

impl<S: BookingStore> BookingService<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>, events: EventBus) -> Self {
        Self {
            store,
            clock,
            events,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn guard(&self) -> ValidationGuard<'_, S> {
        ValidationGuard::new(&self.store, self.clock.today())
    }

    async fn calendar(&self, id: Uuid) -> BookingResult<Calendar> {
        self.store
            .get_calendar(id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("Calendar with ID {} not found", id)))
    }

    async fn slot(&self, id: Uuid) -> BookingResult<SlotInstance> {
        self.store
            .get_slot(id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("Slot with ID {} not found", id)))
    }

    async fn template_label(&self, id: Uuid) -> BookingResult<String> {
        self.store
            .get_template(id)
            .await?
            .map(|template| template.label)
            .ok_or_else(|| BookingError::NotFound(format!("Slot template with ID {} not found", id)))
    }

    fn not_owner(&self, operation: &str, slot_instance_id: Uuid, person_id: Uuid) -> BookingError {
        warn!(
            target: OWNERSHIP_TARGET,
            operation,
            %slot_instance_id,
            %person_id,
            "Caller does not hold the slot it tried to change"
        );
        BookingError::NotOwner
    }

    pub async fn register_template(&self, label: &str) -> BookingResult<SlotTemplate> {
        let label = label.trim();
        if !is_catalog_label(label) {
            return Err(BookingError::Validation(format!(
                "'{}' is not a bookable time of day",
                label
            )));
        }
        Ok(self.store.insert_template(label).await?)
    }

    pub async fn list_templates(&self) -> BookingResult<Vec<SlotTemplate>> {
        Ok(self.store.list_templates().await?)
    }

    /// Creates a provider's calendar for `date` together with one free slot
    /// per template. Repeated template ids are skipped.
    pub async fn create_calendar_with_slots(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
        slot_template_ids: &[Uuid],
    ) -> BookingResult<CalendarCreated> {
        if slot_template_ids.is_empty() {
            return Err(BookingError::Validation(
                "At least one slot template must be selected".to_string(),
            ));
        }

        let guard = self.guard();
        if !guard.is_future_or_today(date) {
            return Err(BookingError::ExpiredCalendar);
        }
        for template_id in slot_template_ids {
            self.template_label(*template_id).await?;
        }
        if guard.calendar_already_exists(provider_id, date).await? {
            debug!(%provider_id, %date, "Calendar creation rejected by pre-check");
            return Err(BookingError::CalendarExists);
        }

        let mut tx = self.store.begin().await?;
        let calendar = tx
            .insert_calendar(provider_id, date)
            .await?
            .ok_or(BookingError::CalendarExists)?;

        let mut created_slot_ids = Vec::with_capacity(slot_template_ids.len());
        for template_id in slot_template_ids {
            match tx.insert_slot(calendar.id, *template_id).await? {
                Some(slot) => created_slot_ids.push(slot.id),
                None => debug!(calendar_id = %calendar.id, %template_id, "Slot already exists, skipping"),
            }
        }
        tx.commit().await?;

        info!(
            calendar_id = %calendar.id,
            %provider_id,
            %date,
            "Calendar created with {} slot(s)",
            created_slot_ids.len()
        );

        Ok(CalendarCreated {
            calendar_id: calendar.id,
            created_slot_ids,
        })
    }

    /// Claims the slot binding `slot_template_id` in `calendar_id` for
    /// `person_id`. At most one of any number of concurrent callers on the
    /// same slot succeeds; the rest get [`BookingError::SlotUnavailable`].
    pub async fn reserve(
        &self,
        calendar_id: Uuid,
        slot_template_id: Uuid,
        person_id: Uuid,
    ) -> BookingResult<Reservation> {
        let calendar = self.calendar(calendar_id).await?;
        let guard = self.guard();
        if !guard.is_future_or_today(calendar.date) {
            debug!(%calendar_id, date = %calendar.date, "Reserve rejected: calendar has passed");
            return Err(BookingError::ExpiredCalendar);
        }
        if guard.has_existing_hold(person_id, calendar_id).await? {
            debug!(%calendar_id, %person_id, "Reserve rejected by pre-check: already holding");
            return Err(BookingError::DuplicateBooking);
        }
        let label = self.template_label(slot_template_id).await?;

        let mut tx = self.store.begin().await?;
        let slot = tx
            .lock_slot(calendar_id, slot_template_id)
            .await?
            .ok_or_else(|| {
                BookingError::NotFound(format!("No {} slot in calendar {}", label, calendar_id))
            })?;

        if tx.hold_in_calendar(calendar_id, person_id).await?.is_some() {
            return Err(BookingError::DuplicateBooking);
        }
        if !slot.is_free() {
            debug!(slot_instance_id = %slot.id, %person_id, "Reserve lost the race for the slot");
            return Err(BookingError::SlotUnavailable);
        }

        let reserved_at = self.clock.now();
        if tx.set_holder(slot.id, person_id, reserved_at).await? == HoldOutcome::HolderConflict {
            return Err(BookingError::DuplicateBooking);
        }
        tx.commit().await?;

        info!(
            slot_instance_id = %slot.id,
            %calendar_id,
            %person_id,
            "Slot {} reserved for {}",
            label,
            calendar.date
        );
        self.events.publish(BookingEvent::Confirmed {
            person_id,
            calendar_id,
            slot_instance_id: slot.id,
            slot_template_label: label,
            date: calendar.date,
            reserved_at,
        });

        Ok(Reservation {
            slot_instance_id: slot.id,
            reserved_at,
        })
    }

    /// Frees a slot held by `person_id`.
    pub async fn cancel(&self, slot_instance_id: Uuid, person_id: Uuid) -> BookingResult<()> {
        let slot = self.slot(slot_instance_id).await?;
        let calendar = self.calendar(slot.calendar_id).await?;
        if !self.guard().is_future_or_today(calendar.date) {
            return Err(BookingError::ExpiredAppointment);
        }
        if !slot.is_held_by(person_id) {
            return Err(self.not_owner("cancel", slot_instance_id, person_id));
        }
        let label = self.template_label(slot.slot_template_id).await?;

        let mut tx = self.store.begin().await?;
        let locked = tx
            .lock_slots(&[slot_instance_id])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BookingError::NotFound(format!("Slot with ID {} not found", slot_instance_id)))?;
        if !locked.is_held_by(person_id) {
            return Err(self.not_owner("cancel", slot_instance_id, person_id));
        }
        tx.clear_holder(slot_instance_id).await?;
        tx.commit().await?;

        info!(
            %slot_instance_id,
            calendar_id = %calendar.id,
            %person_id,
            "Slot {} on {} cancelled",
            label,
            calendar.date
        );
        self.events.publish(BookingEvent::Cancelled {
            person_id,
            calendar_id: calendar.id,
            slot_instance_id,
            slot_template_label: label,
            date: calendar.date,
        });

        Ok(())
    }

    /// Moves a person's hold to another slot of the same calendar. Either the
    /// whole move commits or the old slot stays held.
    pub async fn modify(
        &self,
        old_slot_instance_id: Uuid,
        new_slot_instance_id: Uuid,
        person_id: Uuid,
    ) -> BookingResult<Reservation> {
        if old_slot_instance_id == new_slot_instance_id {
            return Err(BookingError::SameSlot);
        }

        let old = self.slot(old_slot_instance_id).await?;
        let calendar = self.calendar(old.calendar_id).await?;
        if !self.guard().is_future_or_today(calendar.date) {
            return Err(BookingError::ExpiredAppointment);
        }
        if !old.is_held_by(person_id) {
            return Err(self.not_owner("modify", old_slot_instance_id, person_id));
        }
        let new = self.slot(new_slot_instance_id).await?;
        if new.calendar_id != old.calendar_id {
            return Err(BookingError::CalendarMismatch);
        }
        let from_label = self.template_label(old.slot_template_id).await?;
        let to_label = self.template_label(new.slot_template_id).await?;

        let mut tx = self.store.begin().await?;
        let locked = tx
            .lock_slots(&[old_slot_instance_id, new_slot_instance_id])
            .await?;
        let find = |id: Uuid| locked.iter().find(|slot| slot.id == id);
        let (Some(old_locked), Some(new_locked)) =
            (find(old_slot_instance_id), find(new_slot_instance_id))
        else {
            return Err(BookingError::NotFound("Slot removed during reschedule".to_string()));
        };

        if !old_locked.is_held_by(person_id) {
            return Err(self.not_owner("modify", old_slot_instance_id, person_id));
        }
        if !new_locked.is_free() {
            debug!(%new_slot_instance_id, %person_id, "Modify lost the race for the new slot");
            return Err(BookingError::SlotUnavailable);
        }

        tx.clear_holder(old_slot_instance_id).await?;
        let reserved_at = self.clock.now();
        if tx.set_holder(new_slot_instance_id, person_id, reserved_at).await?
            == HoldOutcome::HolderConflict
        {
            return Err(BookingError::DuplicateBooking);
        }
        tx.commit().await?;

        info!(
            calendar_id = %calendar.id,
            %person_id,
            "Booking moved from {} to {} on {}",
            from_label,
            to_label,
            calendar.date
        );
        self.events.publish(BookingEvent::Rescheduled {
            person_id,
            calendar_id: calendar.id,
            from_slot_instance_id: old_slot_instance_id,
            to_slot_instance_id: new_slot_instance_id,
            from_label,
            to_label,
            date: calendar.date,
            reserved_at,
        });

        Ok(Reservation {
            slot_instance_id: new_slot_instance_id,
            reserved_at,
        })
    }

    /// Free slots of a calendar, read without locking. May be stale.
    pub async fn list_available(&self, calendar_id: Uuid) -> BookingResult<Vec<AvailableSlot>> {
        self.calendar(calendar_id).await?;
        Ok(self
            .store
            .list_slots(calendar_id)
            .await?
            .into_iter()
            .filter(|slot| slot.holder_id.is_none())
            .map(AvailableSlot::from)
            .collect())
    }

    pub async fn upcoming_calendars(
        &self,
        provider_id: Option<Uuid>,
    ) -> BookingResult<Vec<CalendarSummary>> {
        Ok(self
            .store
            .list_calendars_from(self.clock.today(), provider_id)
            .await?)
    }

    pub async fn calendar_detail(&self, calendar_id: Uuid) -> BookingResult<CalendarDetail> {
        let calendar = self.calendar(calendar_id).await?;
        if !self.guard().is_future_or_today(calendar.date) {
            return Err(BookingError::ExpiredCalendar);
        }

        let (available, reserved) = self
            .store
            .list_slots(calendar_id)
            .await?
            .into_iter()
            .partition(|slot| slot.holder_id.is_none());

        Ok(CalendarDetail {
            calendar,
            available,
            reserved,
        })
    }

    pub async fn appointments_for(
        &self,
        person_id: Uuid,
        page: usize,
    ) -> BookingResult<Page<Appointment>> {
        let appointments = self.store.list_holds(person_id).await?;
        Ok(Page::paginate(&appointments, page, DEFAULT_PAGE_SIZE))
    }

    /// The data behind a booking receipt for `person_id` in `calendar_id`.
    pub async fn receipt(&self, calendar_id: Uuid, person_id: Uuid) -> BookingResult<Receipt> {
        let calendar = self.calendar(calendar_id).await?;
        let slot = self
            .store
            .find_hold(calendar_id, person_id)
            .await?
            .ok_or_else(|| {
                BookingError::NotFound(format!("No booking in calendar {} for caller", calendar_id))
            })?;
        let reserved_at = slot
            .reserved_at
            .ok_or_else(|| eyre::eyre!("Held slot {} has no reservation time", slot.id))?;

        Ok(Receipt {
            slot_instance_id: slot.id,
            calendar_id,
            provider_id: calendar.provider_id,
            date: calendar.date,
            slot_template_label: self.template_label(slot.slot_template_id).await?,
            reserved_at,
        })
    }

    /// Releases every slot held by a person whose account is being removed.
    /// Past appointments are released too; no events are published.
    pub async fn forget_person(&self, person_id: Uuid) -> BookingResult<usize> {
        let held: Vec<Uuid> = self
            .store
            .list_holds(person_id)
            .await?
            .into_iter()
            .map(|appointment| appointment.slot_instance_id)
            .collect();
        if held.is_empty() {
            return Ok(0);
        }

        let mut tx = self.store.begin().await?;
        let mut released = 0;
        for slot in tx.lock_slots(&held).await? {
            if slot.is_held_by(person_id) {
                tx.clear_holder(slot.id).await?;
                released += 1;
            }
        }
        tx.commit().await?;

        info!(%person_id, "Released {} slot(s) of removed person", released);
        Ok(released)
    }
}
