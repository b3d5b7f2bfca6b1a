use agenda_core::models::{
    calendar::{Calendar, CalendarSummary},
    slot_instance::{Appointment, SlotInstance, SlotView},
    slot_template::SlotTemplate,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use eyre::Result;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::{
    DbPool,
    repositories::{calendar, slot_instance, slot_template},
    store::{BookingStore, HoldOutcome, StoreTransaction},
};

/// [`BookingStore`] backed by PostgreSQL row locks.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

pub struct PgTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl BookingStore for PgStore {
    type Tx = PgTransaction;

    async fn begin(&self) -> Result<PgTransaction> {
        let tx = self.pool.begin().await?;
        Ok(PgTransaction { tx })
    }

    async fn insert_template(&self, label: &str) -> Result<SlotTemplate> {
        Ok(slot_template::create_slot_template(&self.pool, label).await?.into())
    }

    async fn get_template(&self, id: Uuid) -> Result<Option<SlotTemplate>> {
        Ok(slot_template::get_slot_template_by_id(&self.pool, id)
            .await?
            .map(Into::into))
    }

    async fn list_templates(&self) -> Result<Vec<SlotTemplate>> {
        Ok(slot_template::list_slot_templates(&self.pool)
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn get_calendar(&self, id: Uuid) -> Result<Option<Calendar>> {
        Ok(calendar::get_calendar_by_id(&self.pool, id).await?.map(Into::into))
    }

    async fn find_calendar(&self, provider_id: Uuid, date: NaiveDate) -> Result<Option<Calendar>> {
        Ok(calendar::get_calendar_by_provider_and_date(&self.pool, provider_id, date)
            .await?
            .map(Into::into))
    }

    async fn list_calendars_from(
        &self,
        from: NaiveDate,
        provider_id: Option<Uuid>,
    ) -> Result<Vec<CalendarSummary>> {
        Ok(calendar::list_calendars_from(&self.pool, from, provider_id)
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn get_slot(&self, id: Uuid) -> Result<Option<SlotInstance>> {
        Ok(slot_instance::get_slot_instance_by_id(&self.pool, id)
            .await?
            .map(Into::into))
    }

    async fn find_hold(&self, calendar_id: Uuid, person_id: Uuid) -> Result<Option<SlotInstance>> {
        Ok(slot_instance::get_hold_in_calendar(&self.pool, calendar_id, person_id)
            .await?
            .map(Into::into))
    }

    async fn list_slots(&self, calendar_id: Uuid) -> Result<Vec<SlotView>> {
        Ok(slot_instance::get_slot_views_by_calendar_id(&self.pool, calendar_id)
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn list_holds(&self, person_id: Uuid) -> Result<Vec<Appointment>> {
        Ok(slot_instance::get_appointments_by_holder_id(&self.pool, person_id)
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }
}

#[async_trait]
impl StoreTransaction for PgTransaction {
    async fn lock_slot(
        &mut self,
        calendar_id: Uuid,
        slot_template_id: Uuid,
    ) -> Result<Option<SlotInstance>> {
        Ok(slot_instance::lock_slot_instance(&mut self.tx, calendar_id, slot_template_id)
            .await?
            .map(Into::into))
    }

    async fn lock_slots(&mut self, ids: &[Uuid]) -> Result<Vec<SlotInstance>> {
        Ok(slot_instance::lock_slot_instances(&mut self.tx, ids)
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn hold_in_calendar(&mut self, calendar_id: Uuid, person_id: Uuid) -> Result<Option<Uuid>> {
        slot_instance::find_held_slot_id(&mut self.tx, calendar_id, person_id).await
    }

    async fn set_holder(
        &mut self,
        slot_id: Uuid,
        person_id: Uuid,
        reserved_at: DateTime<Utc>,
    ) -> Result<HoldOutcome> {
        let claimed =
            slot_instance::set_slot_holder(&mut self.tx, slot_id, person_id, reserved_at).await?;
        Ok(if claimed {
            HoldOutcome::Claimed
        } else {
            HoldOutcome::HolderConflict
        })
    }

    async fn clear_holder(&mut self, slot_id: Uuid) -> Result<()> {
        slot_instance::clear_slot_holder(&mut self.tx, slot_id).await
    }

    async fn insert_calendar(&mut self, provider_id: Uuid, date: NaiveDate) -> Result<Option<Calendar>> {
        Ok(calendar::insert_calendar(&mut self.tx, provider_id, date)
            .await?
            .map(Into::into))
    }

    async fn insert_slot(
        &mut self,
        calendar_id: Uuid,
        slot_template_id: Uuid,
    ) -> Result<Option<SlotInstance>> {
        Ok(slot_instance::insert_slot_instance(&mut self.tx, calendar_id, slot_template_id)
            .await?
            .map(Into::into))
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
