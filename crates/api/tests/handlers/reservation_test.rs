use agenda_core::models::slot_instance::{Appointment, Page, Receipt, Reservation};
use axum::http::StatusCode;
use chrono::Duration;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::test_utils::{TestContext, as_person, today};

async fn reserve(ctx: &TestContext, calendar_id: Uuid, template_id: Uuid, person: Uuid) -> Reservation {
    let response = as_person(
        ctx.server
            .post(&format!("/api/calendars/{}/reservations", calendar_id)),
        person,
    )
    .json(&json!({ "slot_template_id": template_id }))
    .await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

#[tokio::test]
async fn test_reserve_requires_identity() {
    let ctx = TestContext::new().await;
    let calendar_id = ctx.calendar_on(today()).await;

    let response = ctx
        .server
        .post(&format!("/api/calendars/{}/reservations", calendar_id))
        .json(&json!({ "slot_template_id": ctx.morning.id }))
        .expect_failure()
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["code"], "authentication");
}

#[tokio::test]
async fn test_reserve_taken_slot_conflicts() {
    let ctx = TestContext::new().await;
    let calendar_id = ctx.calendar_on(today()).await;
    reserve(&ctx, calendar_id, ctx.morning.id, Uuid::new_v4()).await;

    let response = as_person(
        ctx.server
            .post(&format!("/api/calendars/{}/reservations", calendar_id)),
        Uuid::new_v4(),
    )
    .json(&json!({ "slot_template_id": ctx.morning.id }))
    .expect_failure()
    .await;

    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["code"], "slot_unavailable");
}

#[tokio::test]
async fn test_second_reservation_in_calendar_conflicts() {
    let ctx = TestContext::new().await;
    let calendar_id = ctx.calendar_on(today()).await;
    let person = Uuid::new_v4();
    reserve(&ctx, calendar_id, ctx.morning.id, person).await;

    let response = as_person(
        ctx.server
            .post(&format!("/api/calendars/{}/reservations", calendar_id)),
        person,
    )
    .json(&json!({ "slot_template_id": ctx.later.id }))
    .expect_failure()
    .await;

    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["code"], "duplicate_booking");
}

#[tokio::test]
async fn test_cancel_own_reservation() {
    let ctx = TestContext::new().await;
    let calendar_id = ctx.calendar_on(today()).await;
    let person = Uuid::new_v4();
    let reservation = reserve(&ctx, calendar_id, ctx.morning.id, person).await;

    as_person(
        ctx.server
            .delete(&format!("/api/slots/{}/reservation", reservation.slot_instance_id)),
        person,
    )
    .await
    .assert_status(StatusCode::NO_CONTENT);

    reserve(&ctx, calendar_id, ctx.morning.id, Uuid::new_v4()).await;
}

#[tokio::test]
async fn test_cancel_someone_elses_reservation_is_forbidden() {
    let ctx = TestContext::new().await;
    let calendar_id = ctx.calendar_on(today()).await;
    let reservation = reserve(&ctx, calendar_id, ctx.morning.id, Uuid::new_v4()).await;

    let response = as_person(
        ctx.server
            .delete(&format!("/api/slots/{}/reservation", reservation.slot_instance_id)),
        Uuid::new_v4(),
    )
    .expect_failure()
    .await;

    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(response.json::<Value>()["code"], "not_owner");
}

#[tokio::test]
async fn test_modify_moves_reservation() {
    let ctx = TestContext::new().await;
    let calendar_id = ctx.calendar_on(today() + Duration::days(7)).await;
    let person = Uuid::new_v4();
    let reservation = reserve(&ctx, calendar_id, ctx.morning.id, person).await;
    let target = ctx.slot_id(calendar_id, "09:00").await;

    let moved: Reservation = as_person(
        ctx.server
            .put(&format!("/api/slots/{}/reservation", reservation.slot_instance_id)),
        person,
    )
    .json(&json!({ "new_slot_instance_id": target }))
    .await
    .json();

    assert_eq!(moved.slot_instance_id, target);
    let receipt: Receipt = as_person(
        ctx.server
            .get(&format!("/api/calendars/{}/receipt", calendar_id)),
        person,
    )
    .await
    .json();
    assert_eq!(receipt.slot_template_label, "09:00");
}

#[tokio::test]
async fn test_modify_to_same_slot_is_bad_request() {
    let ctx = TestContext::new().await;
    let calendar_id = ctx.calendar_on(today()).await;
    let person = Uuid::new_v4();
    let reservation = reserve(&ctx, calendar_id, ctx.morning.id, person).await;

    let response = as_person(
        ctx.server
            .put(&format!("/api/slots/{}/reservation", reservation.slot_instance_id)),
        person,
    )
    .json(&json!({ "new_slot_instance_id": reservation.slot_instance_id }))
    .expect_failure()
    .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "same_slot");
}

#[tokio::test]
async fn test_receipt_without_booking_is_not_found() {
    let ctx = TestContext::new().await;
    let calendar_id = ctx.calendar_on(today()).await;

    as_person(
        ctx.server
            .get(&format!("/api/calendars/{}/receipt", calendar_id)),
        Uuid::new_v4(),
    )
    .expect_failure()
    .await
    .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_my_appointments_are_paged() {
    let ctx = TestContext::new().await;
    let person = Uuid::new_v4();
    for offset in 0..6 {
        let calendar_id = ctx.calendar_on(today() + Duration::days(offset)).await;
        reserve(&ctx, calendar_id, ctx.later.id, person).await;
    }

    let first: Page<Appointment> = as_person(ctx.server.get("/api/me/appointments"), person)
        .await
        .json();
    let clamped: Page<Appointment> = as_person(ctx.server.get("/api/me/appointments"), person)
        .add_query_param("page", -3)
        .await
        .json();
    let second: Page<Appointment> = as_person(ctx.server.get("/api/me/appointments"), person)
        .add_query_param("page", 2)
        .await
        .json();

    assert_eq!(first.items.len(), 5);
    assert_eq!(first.total_pages, 2);
    assert_eq!(clamped.page, 1);
    assert_eq!(second.items.len(), 1);
    assert_eq!(second.items[0].date, today() + Duration::days(5));
}

#[tokio::test]
async fn test_booking_writes_are_rate_limited() {
    let ctx = TestContext::with_rate_limit(2).await;
    let calendar_id = ctx.calendar_on(today()).await;
    let person = Uuid::new_v4();
    let reservation = reserve(&ctx, calendar_id, ctx.morning.id, person).await;
    let cancel_path = format!("/api/slots/{}/reservation", reservation.slot_instance_id);

    let reserve_path = format!("/api/calendars/{}/reservations", calendar_id);
    as_person(ctx.server.post(&reserve_path), person)
        .json(&json!({ "slot_template_id": ctx.later.id }))
        .expect_failure()
        .await
        .assert_status(StatusCode::CONFLICT);
    let response = as_person(ctx.server.post(&reserve_path), person)
        .json(&json!({ "slot_template_id": ctx.later.id }))
        .expect_failure()
        .await;
    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.json::<Value>()["code"], "rate_limited");

    as_person(ctx.server.delete(&cancel_path), person)
        .await
        .assert_status(StatusCode::NO_CONTENT);
}
