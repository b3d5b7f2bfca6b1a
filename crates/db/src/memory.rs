//! In-process [`BookingStore`] with the same locking semantics as the
//! PostgreSQL store.
//!
//! Every slot row carries its own async mutex standing in for a row lock.
//! Transactions buffer their writes and publish them on commit, so readers
//! that do not lock only ever see committed state. Unique keys (one calendar
//! per provider and day, one slot per template and calendar, one hold per
//! person and calendar) are claimed eagerly and released again if the
//! transaction is dropped without committing.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use agenda_core::models::{
    calendar::{Calendar, CalendarSummary},
    slot_instance::{Appointment, SlotInstance, SlotView},
    slot_template::SlotTemplate,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::{DashMap, mapref::entry::Entry};
use eyre::{Result, eyre};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use uuid::Uuid;

use crate::store::{BookingStore, HoldOutcome, StoreTransaction};

type HoldKey = (Uuid, Uuid);
type CalendarKey = (Uuid, NaiveDate);
type SlotKey = (Uuid, Uuid);

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    templates: DashMap<Uuid, SlotTemplate>,
    template_labels: DashMap<String, Uuid>,
    calendars: DashMap<Uuid, Calendar>,
    calendar_keys: DashMap<CalendarKey, Uuid>,
    slots: DashMap<Uuid, Arc<SlotRow>>,
    slot_keys: DashMap<SlotKey, Uuid>,
    /// (calendar, person) -> slot, including claims of in-flight transactions.
    holds: DashMap<HoldKey, Uuid>,
}

#[derive(Debug)]
struct SlotRow {
    lock: Arc<Mutex<()>>,
    committed: RwLock<SlotInstance>,
}

impl SlotRow {
    fn new(slot: SlotInstance) -> Self {
        Self {
            lock: Arc::new(Mutex::new(())),
            committed: RwLock::new(slot),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn row(&self, id: Uuid) -> Option<Arc<SlotRow>> {
        self.inner.slots.get(&id).map(|row| row.value().clone())
    }

    fn calendar_rows(&self, calendar_id: Uuid) -> Vec<Arc<SlotRow>> {
        let ids: Vec<Uuid> = self
            .inner
            .slot_keys
            .iter()
            .filter(|entry| entry.key().0 == calendar_id)
            .map(|entry| *entry.value())
            .collect();
        ids.into_iter().filter_map(|id| self.row(id)).collect()
    }

    fn label_of(&self, template_id: Uuid) -> String {
        self.inner
            .templates
            .get(&template_id)
            .map(|template| template.label.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    type Tx = MemoryTransaction;

    async fn begin(&self) -> Result<MemoryTransaction> {
        Ok(MemoryTransaction::new(self.inner.clone()))
    }

    async fn insert_template(&self, label: &str) -> Result<SlotTemplate> {
        match self.inner.template_labels.entry(label.to_string()) {
            Entry::Occupied(existing) => self
                .inner
                .templates
                .get(existing.get())
                .map(|template| template.clone())
                .ok_or_else(|| eyre!("Slot template {} is indexed but missing", label)),
            Entry::Vacant(vacant) => {
                let template = SlotTemplate {
                    id: Uuid::new_v4(),
                    label: label.to_string(),
                    created_at: Utc::now(),
                };
                self.inner.templates.insert(template.id, template.clone());
                vacant.insert(template.id);
                Ok(template)
            }
        }
    }

    async fn get_template(&self, id: Uuid) -> Result<Option<SlotTemplate>> {
        Ok(self.inner.templates.get(&id).map(|template| template.clone()))
    }

    async fn list_templates(&self) -> Result<Vec<SlotTemplate>> {
        let mut templates: Vec<SlotTemplate> = self
            .inner
            .templates
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        templates.sort_by(|a, b| a.label.cmp(&b.label));
        Ok(templates)
    }

    async fn get_calendar(&self, id: Uuid) -> Result<Option<Calendar>> {
        Ok(self.inner.calendars.get(&id).map(|calendar| calendar.clone()))
    }

    async fn find_calendar(&self, provider_id: Uuid, date: NaiveDate) -> Result<Option<Calendar>> {
        let id = self
            .inner
            .calendar_keys
            .get(&(provider_id, date))
            .map(|id| *id.value());
        Ok(id.and_then(|id| self.inner.calendars.get(&id).map(|calendar| calendar.clone())))
    }

    async fn list_calendars_from(
        &self,
        from: NaiveDate,
        provider_id: Option<Uuid>,
    ) -> Result<Vec<CalendarSummary>> {
        let mut calendars: Vec<Calendar> = self
            .inner
            .calendars
            .iter()
            .map(|entry| entry.value().clone())
            .filter(|calendar| calendar.date >= from)
            .filter(|calendar| provider_id.is_none_or(|p| calendar.provider_id == p))
            .collect();
        calendars.sort_by(|a, b| (a.date, a.provider_id).cmp(&(b.date, b.provider_id)));

        let mut summaries = Vec::with_capacity(calendars.len());
        for calendar in calendars {
            let rows = self.calendar_rows(calendar.id);
            let mut available = 0;
            for row in &rows {
                if row.committed.read().await.is_free() {
                    available += 1;
                }
            }
            summaries.push(CalendarSummary {
                calendar,
                available,
                total: rows.len(),
            });
        }
        Ok(summaries)
    }

    async fn get_slot(&self, id: Uuid) -> Result<Option<SlotInstance>> {
        match self.row(id) {
            Some(row) => Ok(Some(row.committed.read().await.clone())),
            None => Ok(None),
        }
    }

    async fn find_hold(&self, calendar_id: Uuid, person_id: Uuid) -> Result<Option<SlotInstance>> {
        let slot_id = self
            .inner
            .holds
            .get(&(calendar_id, person_id))
            .map(|slot| *slot.value());
        let Some(row) = slot_id.and_then(|id| self.row(id)) else {
            return Ok(None);
        };
        let slot = row.committed.read().await.clone();
        Ok(slot.is_held_by(person_id).then_some(slot))
    }

    async fn list_slots(&self, calendar_id: Uuid) -> Result<Vec<SlotView>> {
        let mut views = Vec::new();
        for row in self.calendar_rows(calendar_id) {
            let slot = row.committed.read().await.clone();
            views.push(SlotView {
                slot_instance_id: slot.id,
                calendar_id: slot.calendar_id,
                slot_template_id: slot.slot_template_id,
                slot_template_label: self.label_of(slot.slot_template_id),
                holder_id: slot.holder_id,
                reserved_at: slot.reserved_at,
            });
        }
        views.sort_by(|a, b| a.slot_template_label.cmp(&b.slot_template_label));
        Ok(views)
    }

    async fn list_holds(&self, person_id: Uuid) -> Result<Vec<Appointment>> {
        let slot_ids: Vec<Uuid> = self
            .inner
            .holds
            .iter()
            .filter(|entry| entry.key().1 == person_id)
            .map(|entry| *entry.value())
            .collect();

        let mut appointments = Vec::new();
        for row in slot_ids.into_iter().filter_map(|id| self.row(id)) {
            let slot = row.committed.read().await.clone();
            let (Some(reserved_at), true) = (slot.reserved_at, slot.is_held_by(person_id)) else {
                continue;
            };
            let Some(calendar) = self.inner.calendars.get(&slot.calendar_id).map(|c| c.clone()) else {
                continue;
            };
            appointments.push(Appointment {
                slot_instance_id: slot.id,
                calendar_id: calendar.id,
                provider_id: calendar.provider_id,
                date: calendar.date,
                slot_template_label: self.label_of(slot.slot_template_id),
                reserved_at,
            });
        }
        appointments.sort_by(|a, b| {
            (a.date, &a.slot_template_label).cmp(&(b.date, &b.slot_template_label))
        });
        Ok(appointments)
    }
}

enum Undo {
    Hold {
        key: HoldKey,
        slot_id: Uuid,
        previous: Option<Uuid>,
    },
    Calendar(CalendarKey),
    Slot(SlotKey),
}

pub struct MemoryTransaction {
    inner: Arc<Inner>,
    guards: BTreeMap<Uuid, (Arc<SlotRow>, OwnedMutexGuard<()>)>,
    /// Working copy of every row this transaction has locked.
    pending: BTreeMap<Uuid, SlotInstance>,
    dirty: BTreeSet<Uuid>,
    released: Vec<(HoldKey, Uuid)>,
    new_calendars: Vec<Calendar>,
    new_slots: Vec<SlotInstance>,
    undo: Vec<Undo>,
    finished: bool,
}

impl MemoryTransaction {
    fn new(inner: Arc<Inner>) -> Self {
        Self {
            inner,
            guards: BTreeMap::new(),
            pending: BTreeMap::new(),
            dirty: BTreeSet::new(),
            released: Vec::new(),
            new_calendars: Vec::new(),
            new_slots: Vec::new(),
            undo: Vec::new(),
            finished: false,
        }
    }

    async fn lock_row(&mut self, id: Uuid) -> Option<SlotInstance> {
        if let Some(slot) = self.pending.get(&id) {
            return Some(slot.clone());
        }

        let row = self.inner.slots.get(&id).map(|row| row.value().clone())?;
        let guard = row.lock.clone().lock_owned().await;
        let slot = row.committed.read().await.clone();

        self.guards.insert(id, (row, guard));
        self.pending.insert(id, slot.clone());
        Some(slot)
    }

    fn locked_mut(&mut self, slot_id: Uuid) -> Result<&mut SlotInstance> {
        self.pending
            .get_mut(&slot_id)
            .ok_or_else(|| eyre!("Slot {} is not locked by this transaction", slot_id))
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn lock_slot(
        &mut self,
        calendar_id: Uuid,
        slot_template_id: Uuid,
    ) -> Result<Option<SlotInstance>> {
        let id = self
            .inner
            .slot_keys
            .get(&(calendar_id, slot_template_id))
            .map(|id| *id.value());
        match id {
            Some(id) => Ok(self.lock_row(id).await),
            None => Ok(None),
        }
    }

    async fn lock_slots(&mut self, ids: &[Uuid]) -> Result<Vec<SlotInstance>> {
        let ordered: BTreeSet<Uuid> = ids.iter().copied().collect();
        let mut slots = Vec::with_capacity(ordered.len());
        for id in ordered {
            if let Some(slot) = self.lock_row(id).await {
                slots.push(slot);
            }
        }
        Ok(slots)
    }

    async fn hold_in_calendar(&mut self, calendar_id: Uuid, person_id: Uuid) -> Result<Option<Uuid>> {
        if let Some(slot) = self
            .pending
            .values()
            .find(|slot| slot.calendar_id == calendar_id && slot.is_held_by(person_id))
        {
            return Ok(Some(slot.id));
        }

        let held = self
            .inner
            .holds
            .get(&(calendar_id, person_id))
            .map(|slot| *slot.value());
        Ok(held.filter(|slot_id| match self.pending.get(slot_id) {
            // Freed earlier in this transaction.
            Some(slot) => slot.is_held_by(person_id),
            None => true,
        }))
    }

    async fn set_holder(
        &mut self,
        slot_id: Uuid,
        person_id: Uuid,
        reserved_at: DateTime<Utc>,
    ) -> Result<HoldOutcome> {
        let calendar_id = self.locked_mut(slot_id)?.calendar_id;
        let key = (calendar_id, person_id);

        match self.inner.holds.entry(key) {
            Entry::Occupied(mut held) => {
                let current = *held.get();
                if current != slot_id {
                    let freed_here = self
                        .pending
                        .get(&current)
                        .is_some_and(|slot| !slot.is_held_by(person_id));
                    if !freed_here {
                        return Ok(HoldOutcome::HolderConflict);
                    }
                    held.insert(slot_id);
                    self.undo.push(Undo::Hold {
                        key,
                        slot_id,
                        previous: Some(current),
                    });
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(slot_id);
                self.undo.push(Undo::Hold {
                    key,
                    slot_id,
                    previous: None,
                });
            }
        }

        let slot = self.locked_mut(slot_id)?;
        slot.holder_id = Some(person_id);
        slot.reserved_at = Some(reserved_at);
        self.dirty.insert(slot_id);
        Ok(HoldOutcome::Claimed)
    }

    async fn clear_holder(&mut self, slot_id: Uuid) -> Result<()> {
        let slot = self.locked_mut(slot_id)?;
        let previous = slot.holder_id.take().map(|person_id| (slot.calendar_id, person_id));
        slot.reserved_at = None;

        if let Some(key) = previous {
            self.released.push((key, slot_id));
        }
        self.dirty.insert(slot_id);
        Ok(())
    }

    async fn insert_calendar(&mut self, provider_id: Uuid, date: NaiveDate) -> Result<Option<Calendar>> {
        let key = (provider_id, date);
        match self.inner.calendar_keys.entry(key) {
            Entry::Occupied(_) => Ok(None),
            Entry::Vacant(vacant) => {
                let calendar = Calendar {
                    id: Uuid::new_v4(),
                    provider_id,
                    date,
                    created_at: Utc::now(),
                };
                vacant.insert(calendar.id);
                self.undo.push(Undo::Calendar(key));
                self.new_calendars.push(calendar.clone());
                Ok(Some(calendar))
            }
        }
    }

    async fn insert_slot(
        &mut self,
        calendar_id: Uuid,
        slot_template_id: Uuid,
    ) -> Result<Option<SlotInstance>> {
        let key = (calendar_id, slot_template_id);
        match self.inner.slot_keys.entry(key) {
            Entry::Occupied(_) => Ok(None),
            Entry::Vacant(vacant) => {
                let slot = SlotInstance::free(calendar_id, slot_template_id);
                vacant.insert(slot.id);
                self.undo.push(Undo::Slot(key));
                self.new_slots.push(slot.clone());
                Ok(Some(slot))
            }
        }
    }

    async fn commit(mut self) -> Result<()> {
        for id in &self.dirty {
            if let (Some((row, _guard)), Some(slot)) = (self.guards.get(id), self.pending.get(id)) {
                *row.committed.write().await = slot.clone();
            }
        }
        for (key, slot_id) in std::mem::take(&mut self.released) {
            self.inner.holds.remove_if(&key, |_, held| *held == slot_id);
        }
        // Slots first: a visible calendar must already have its rows.
        for slot in std::mem::take(&mut self.new_slots) {
            self.inner.slots.insert(slot.id, Arc::new(SlotRow::new(slot)));
        }
        for calendar in std::mem::take(&mut self.new_calendars) {
            self.inner.calendars.insert(calendar.id, calendar);
        }

        self.undo.clear();
        self.finished = true;
        Ok(())
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        // Row guards are still held here; they are released after this runs.
        for undo in self.undo.drain(..).rev() {
            match undo {
                Undo::Hold {
                    key,
                    slot_id,
                    previous: None,
                } => {
                    self.inner.holds.remove_if(&key, |_, held| *held == slot_id);
                }
                Undo::Hold {
                    key,
                    previous: Some(previous),
                    ..
                } => {
                    self.inner.holds.insert(key, previous);
                }
                Undo::Calendar(key) => {
                    self.inner.calendar_keys.remove(&key);
                }
                Undo::Slot(key) => {
                    self.inner.slot_keys.remove(&key);
                }
            }
        }
    }
}
