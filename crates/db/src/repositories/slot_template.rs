use crate::models::DbSlotTemplate;
use chrono::Utc;
use eyre::{Result, eyre};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

pub async fn create_slot_template(pool: &Pool<Postgres>, label: &str) -> Result<DbSlotTemplate> {
    let inserted = sqlx::query_as::<_, DbSlotTemplate>(
        r#"
        INSERT INTO slot_templates (id, label, created_at)
        VALUES ($1, $2, $3)
        ON CONFLICT (label) DO NOTHING
        RETURNING id, label, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(label)
    .bind(Utc::now())
    .fetch_optional(pool)
    .await?;

    if let Some(template) = inserted {
        tracing::debug!("Slot template created: id={}, label={}", template.id, template.label);
        return Ok(template);
    }

    get_slot_template_by_label(pool, label)
        .await?
        .ok_or_else(|| eyre!("Slot template {} vanished after conflict", label))
}

pub async fn get_slot_template_by_id(
    pool: &Pool<Postgres>,
    id: Uuid,
) -> Result<Option<DbSlotTemplate>> {
    let template = sqlx::query_as::<_, DbSlotTemplate>(
        r#"
        SELECT id, label, created_at
        FROM slot_templates
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(template)
}

pub async fn get_slot_template_by_label(
    pool: &Pool<Postgres>,
    label: &str,
) -> Result<Option<DbSlotTemplate>> {
    let template = sqlx::query_as::<_, DbSlotTemplate>(
        r#"
        SELECT id, label, created_at
        FROM slot_templates
        WHERE label = $1
        "#,
    )
    .bind(label)
    .fetch_optional(pool)
    .await?;

    Ok(template)
}

pub async fn list_slot_templates(pool: &Pool<Postgres>) -> Result<Vec<DbSlotTemplate>> {
    let templates = sqlx::query_as::<_, DbSlotTemplate>(
        r#"
        SELECT id, label, created_at
        FROM slot_templates
        ORDER BY label ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(templates)
}
