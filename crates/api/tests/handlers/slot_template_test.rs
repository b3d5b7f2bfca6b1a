use agenda_core::models::slot_template::SlotTemplate;
use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use crate::test_utils::TestContext;

#[tokio::test]
async fn test_list_templates_sorted_by_label() {
    let ctx = TestContext::new().await;
    ctx.server
        .post("/api/slot-templates")
        .json(&json!({ "label": "07:00" }))
        .expect_failure()
        .await;
    ctx.server
        .post("/api/slot-templates")
        .json(&json!({ "label": "18:00" }))
        .await
        .assert_status(StatusCode::CREATED);

    let templates: Vec<SlotTemplate> = ctx.server.get("/api/slot-templates").await.json();
    let labels: Vec<_> = templates.iter().map(|t| t.label.as_str()).collect();

    assert_eq!(labels, vec!["08:00", "09:00", "18:00"]);
}

#[tokio::test]
async fn test_create_template_rejects_unknown_label() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/api/slot-templates")
        .json(&json!({ "label": "25:00" }))
        .expect_failure()
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "validation");
}

#[tokio::test]
async fn test_create_existing_template_returns_it() {
    let ctx = TestContext::new().await;

    let template: SlotTemplate = ctx
        .server
        .post("/api/slot-templates")
        .json(&json!({ "label": "08:00" }))
        .await
        .json();

    assert_eq!(template.id, ctx.morning.id);
}
