use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    // Create slot_templates table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS slot_templates (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            label VARCHAR(16) NOT NULL UNIQUE,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create calendars table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS calendars (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            provider_id UUID NOT NULL,
            date DATE NOT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT calendars_provider_date_key UNIQUE (provider_id, date)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create slot_instances table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS slot_instances (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            calendar_id UUID NOT NULL REFERENCES calendars(id) ON DELETE CASCADE,
            slot_template_id UUID NOT NULL REFERENCES slot_templates(id) ON DELETE RESTRICT,
            holder_id UUID NULL,
            reserved_at TIMESTAMP WITH TIME ZONE NULL,
            CONSTRAINT slot_instances_calendar_template_key UNIQUE (calendar_id, slot_template_id),
            CONSTRAINT holder_and_reserved_at CHECK ((holder_id IS NULL) = (reserved_at IS NULL))
        );
        "#,
    )
    .execute(pool)
    .await?;

    // One hold per person per calendar
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS slot_instances_one_hold_per_calendar
            ON slot_instances(calendar_id, holder_id)
            WHERE holder_id IS NOT NULL;
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes
    for statement in [
        "CREATE INDEX IF NOT EXISTS idx_calendars_date ON calendars(date)",
        "CREATE INDEX IF NOT EXISTS idx_slot_instances_holder_id ON slot_instances(holder_id)",
    ] {
        sqlx::query(statement).execute(pool).await?;
    }

    info!("Database schema initialized successfully.");
    Ok(())
}
