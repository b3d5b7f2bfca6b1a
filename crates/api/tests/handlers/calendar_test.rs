use agenda_core::models::{
    calendar::{CalendarCreated, CalendarDetail, CalendarSummary},
    slot_instance::AvailableSlot,
};
use axum::http::StatusCode;
use chrono::Duration;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::test_utils::{TestContext, as_person, today};

#[tokio::test]
async fn test_create_calendar() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/api/calendars")
        .json(&json!({
            "provider_id": Uuid::new_v4(),
            "date": today() + Duration::days(1),
            "slot_template_ids": [ctx.morning.id, ctx.later.id],
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let created: CalendarCreated = response.json();
    assert_eq!(created.created_slot_ids.len(), 2);
}

#[tokio::test]
async fn test_create_calendar_twice_conflicts() {
    let ctx = TestContext::new().await;
    let body = json!({
        "provider_id": Uuid::new_v4(),
        "date": today() + Duration::days(1),
        "slot_template_ids": [ctx.morning.id],
    });

    ctx.server
        .post("/api/calendars")
        .json(&body)
        .await
        .assert_status(StatusCode::CREATED);
    let response = ctx
        .server
        .post("/api/calendars")
        .json(&body)
        .expect_failure()
        .await;

    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["code"], "calendar_exists");
}

#[tokio::test]
async fn test_create_calendar_in_the_past() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/api/calendars")
        .json(&json!({
            "provider_id": Uuid::new_v4(),
            "date": today() - Duration::days(1),
            "slot_template_ids": [ctx.morning.id],
        }))
        .expect_failure()
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json::<Value>()["code"], "expired_calendar");
}

#[tokio::test]
async fn test_available_slots_shrink_after_reservation() {
    let ctx = TestContext::new().await;
    let calendar_id = ctx.calendar_on(today() + Duration::days(2)).await;

    as_person(
        ctx.server
            .post(&format!("/api/calendars/{}/reservations", calendar_id)),
        Uuid::new_v4(),
    )
    .json(&json!({ "slot_template_id": ctx.morning.id }))
    .await
    .assert_status(StatusCode::CREATED);

    let available: Vec<AvailableSlot> = ctx
        .server
        .get(&format!("/api/calendars/{}/available", calendar_id))
        .await
        .json();
    assert_eq!(available.len(), 1);
    assert_eq!(available[0].slot_template_label, "09:00");

    let detail: CalendarDetail = ctx
        .server
        .get(&format!("/api/calendars/{}", calendar_id))
        .await
        .json();
    assert_eq!(detail.reserved.len(), 1);
    assert_eq!(detail.reserved[0].slot_template_label, "08:00");
}

#[tokio::test]
async fn test_list_upcoming_calendars_by_provider() {
    let ctx = TestContext::new().await;
    let provider = Uuid::new_v4();
    for offset in [3, 1] {
        ctx.server
            .post("/api/calendars")
            .json(&json!({
                "provider_id": provider,
                "date": today() + Duration::days(offset),
                "slot_template_ids": [ctx.morning.id],
            }))
            .await
            .assert_status(StatusCode::CREATED);
    }
    ctx.calendar_on(today()).await;

    let mine: Vec<CalendarSummary> = ctx
        .server
        .get("/api/calendars")
        .add_query_param("provider_id", provider)
        .await
        .json();
    let all: Vec<CalendarSummary> = ctx.server.get("/api/calendars").await.json();

    assert_eq!(mine.len(), 2);
    assert_eq!(mine[0].calendar.date, today() + Duration::days(1));
    assert_eq!((mine[0].available, mine[0].total), (1, 1));
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn test_unknown_calendar_is_not_found() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .get(&format!("/api/calendars/{}/available", Uuid::new_v4()))
        .expect_failure()
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}
