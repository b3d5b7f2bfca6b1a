#![allow(dead_code)]

use std::sync::Arc;

use agenda_core::{
    clock::{Clock, FixedClock},
    models::slot_template::SlotTemplate,
};
use agenda_db::{BookingStore, MemoryStore};
use agenda_engine::{BookingService, EventBus};
use chrono::{Duration, NaiveDate};
use uuid::Uuid;

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2031, 3, 10).unwrap()
}

pub struct TestContext {
    pub service: Arc<BookingService<MemoryStore>>,
    pub store: MemoryStore,
    pub morning: SlotTemplate,
    pub later: SlotTemplate,
    pub noon: SlotTemplate,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_events(EventBus::new()).await
    }

    pub async fn with_events(events: EventBus) -> Self {
        let store = MemoryStore::new();
        let morning = store.insert_template("08:00").await.unwrap();
        let later = store.insert_template("09:00").await.unwrap();
        let noon = store.insert_template("12:00").await.unwrap();
        let service = Arc::new(BookingService::new(
            store.clone(),
            Arc::new(FixedClock::new(today())),
            events,
        ));

        Self {
            service,
            store,
            morning,
            later,
            noon,
        }
    }

    /// A second service over the same data, seeing the world on `day`.
    pub fn service_on(&self, day: NaiveDate) -> BookingService<MemoryStore> {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(day));
        BookingService::new(self.store.clone(), clock, EventBus::new())
    }

    /// Calendar a week from today with the 08:00 and 09:00 slots.
    pub async fn calendar(&self) -> Uuid {
        self.calendar_on(today() + Duration::days(7)).await
    }

    pub async fn calendar_on(&self, date: NaiveDate) -> Uuid {
        self.service
            .create_calendar_with_slots(Uuid::new_v4(), date, &[self.morning.id, self.later.id])
            .await
            .unwrap()
            .calendar_id
    }

    pub async fn holder_of(&self, calendar_id: Uuid, label: &str) -> Option<Uuid> {
        self.store
            .list_slots(calendar_id)
            .await
            .unwrap()
            .into_iter()
            .find(|slot| slot.slot_template_label == label)
            .and_then(|slot| slot.holder_id)
    }

    pub async fn slot_id(&self, calendar_id: Uuid, label: &str) -> Uuid {
        self.store
            .list_slots(calendar_id)
            .await
            .unwrap()
            .into_iter()
            .find(|slot| slot.slot_template_label == label)
            .map(|slot| slot.slot_instance_id)
            .unwrap()
    }
}
