use std::{sync::Arc, time::Duration};

use agenda_api::{ApiState, app, middleware::rate_limit::FixedWindowRateLimiter};
use agenda_core::{clock::FixedClock, models::slot_template::SlotTemplate};
use agenda_db::{BookingStore, MemoryStore};
use agenda_engine::{BookingService, EventBus};
use axum::http::{HeaderName, HeaderValue};
use axum_test::{TestRequest, TestServer};
use chrono::NaiveDate;
use serde_json::json;
use uuid::Uuid;

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2031, 6, 2).unwrap()
}

pub struct TestContext {
    pub server: TestServer,
    pub store: MemoryStore,
    pub morning: SlotTemplate,
    pub later: SlotTemplate,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_rate_limit(1_000).await
    }

    pub async fn with_rate_limit(max: u32) -> Self {
        let store = MemoryStore::new();
        let morning = store.insert_template("08:00").await.unwrap();
        let later = store.insert_template("09:00").await.unwrap();

        let state = ApiState {
            booking: BookingService::new(
                store.clone(),
                Arc::new(FixedClock::new(today())),
                EventBus::new(),
            ),
            rate_limiter: Arc::new(FixedWindowRateLimiter::new(max, Duration::from_secs(300))),
        };
        let server = TestServer::new(app(Arc::new(state))).unwrap();

        Self {
            server,
            store,
            morning,
            later,
        }
    }

    /// Creates a calendar on `date` with the 08:00 and 09:00 slots.
    pub async fn calendar_on(&self, date: NaiveDate) -> Uuid {
        let response = self
            .server
            .post("/api/calendars")
            .json(&json!({
                "provider_id": Uuid::new_v4(),
                "date": date,
                "slot_template_ids": [self.morning.id, self.later.id],
            }))
            .await;
        response.json::<serde_json::Value>()["calendar_id"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap()
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

pub fn as_person(request: TestRequest, person_id: Uuid) -> TestRequest {
    request.add_header(
        HeaderName::from_static("x-person-id"),
        HeaderValue::from_str(&person_id.to_string()).unwrap(),
    )
}
