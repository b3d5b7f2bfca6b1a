//! Advisory pre-checks run before any lock is taken.
//!
//! None of these are race-free on their own. The booking service repeats the
//! decisive checks under the row locks; a pass here only means the request is
//! worth a transaction.

use agenda_core::clock::is_future_or_today;
use agenda_db::BookingStore;
use chrono::NaiveDate;
use eyre::Result;
use uuid::Uuid;

pub struct ValidationGuard<'a, S> {
    store: &'a S,
    today: NaiveDate,
}

impl<'a, S: BookingStore> ValidationGuard<'a, S> {
    pub fn new(store: &'a S, today: NaiveDate) -> Self {
        Self { store, today }
    }

    pub fn is_future_or_today(&self, date: NaiveDate) -> bool {
        is_future_or_today(date, self.today)
    }

    pub async fn has_existing_hold(&self, person_id: Uuid, calendar_id: Uuid) -> Result<bool> {
        Ok(self.store.find_hold(calendar_id, person_id).await?.is_some())
    }

    pub async fn calendar_already_exists(&self, provider_id: Uuid, date: NaiveDate) -> Result<bool> {
        Ok(self.store.find_calendar(provider_id, date).await?.is_some())
    }
}
