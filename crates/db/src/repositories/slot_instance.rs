use crate::models::{DbAppointment, DbSlotInstance, DbSlotView};
use chrono::{DateTime, Utc};
use eyre::Result;
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

/// Creates a free slot inside the caller's transaction. Returns `None` when the
/// calendar already binds the template.
pub async fn insert_slot_instance(
    conn: &mut PgConnection,
    calendar_id: Uuid,
    slot_template_id: Uuid,
) -> Result<Option<DbSlotInstance>> {
    let slot = sqlx::query_as::<_, DbSlotInstance>(
        r#"
        INSERT INTO slot_instances (id, calendar_id, slot_template_id, holder_id, reserved_at)
        VALUES ($1, $2, $3, NULL, NULL)
        ON CONFLICT (calendar_id, slot_template_id) DO NOTHING
        RETURNING id, calendar_id, slot_template_id, holder_id, reserved_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(calendar_id)
    .bind(slot_template_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(slot)
}

pub async fn get_slot_instance_by_id(
    pool: &Pool<Postgres>,
    id: Uuid,
) -> Result<Option<DbSlotInstance>> {
    let slot = sqlx::query_as::<_, DbSlotInstance>(
        r#"
        SELECT id, calendar_id, slot_template_id, holder_id, reserved_at
        FROM slot_instances
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(slot)
}

pub async fn get_hold_in_calendar(
    pool: &Pool<Postgres>,
    calendar_id: Uuid,
    person_id: Uuid,
) -> Result<Option<DbSlotInstance>> {
    let slot = sqlx::query_as::<_, DbSlotInstance>(
        r#"
        SELECT id, calendar_id, slot_template_id, holder_id, reserved_at
        FROM slot_instances
        WHERE calendar_id = $1 AND holder_id = $2
        "#,
    )
    .bind(calendar_id)
    .bind(person_id)
    .fetch_optional(pool)
    .await?;

    Ok(slot)
}

pub async fn get_slot_views_by_calendar_id(
    pool: &Pool<Postgres>,
    calendar_id: Uuid,
) -> Result<Vec<DbSlotView>> {
    let slots = sqlx::query_as::<_, DbSlotView>(
        r#"
        SELECT s.id AS slot_instance_id, s.calendar_id, s.slot_template_id,
               t.label AS slot_template_label, s.holder_id, s.reserved_at
        FROM slot_instances s
        JOIN slot_templates t ON t.id = s.slot_template_id
        WHERE s.calendar_id = $1
        ORDER BY t.label ASC
        "#,
    )
    .bind(calendar_id)
    .fetch_all(pool)
    .await?;

    Ok(slots)
}

pub async fn get_appointments_by_holder_id(
    pool: &Pool<Postgres>,
    person_id: Uuid,
) -> Result<Vec<DbAppointment>> {
    let appointments = sqlx::query_as::<_, DbAppointment>(
        r#"
        SELECT s.id AS slot_instance_id, s.calendar_id, c.provider_id, c.date,
               t.label AS slot_template_label, s.reserved_at
        FROM slot_instances s
        JOIN calendars c ON c.id = s.calendar_id
        JOIN slot_templates t ON t.id = s.slot_template_id
        WHERE s.holder_id = $1
        ORDER BY c.date ASC, t.label ASC
        "#,
    )
    .bind(person_id)
    .fetch_all(pool)
    .await?;

    Ok(appointments)
}

/// `SELECT ... FOR UPDATE` on one (calendar, template) binding.
pub async fn lock_slot_instance(
    conn: &mut PgConnection,
    calendar_id: Uuid,
    slot_template_id: Uuid,
) -> Result<Option<DbSlotInstance>> {
    let slot = sqlx::query_as::<_, DbSlotInstance>(
        r#"
        SELECT id, calendar_id, slot_template_id, holder_id, reserved_at
        FROM slot_instances
        WHERE calendar_id = $1 AND slot_template_id = $2
        FOR UPDATE
        "#,
    )
    .bind(calendar_id)
    .bind(slot_template_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(slot)
}

/// Row locks are taken in id order so two transactions locking the same pair
/// cannot deadlock.
pub async fn lock_slot_instances(
    conn: &mut PgConnection,
    ids: &[Uuid],
) -> Result<Vec<DbSlotInstance>> {
    let slots = sqlx::query_as::<_, DbSlotInstance>(
        r#"
        SELECT id, calendar_id, slot_template_id, holder_id, reserved_at
        FROM slot_instances
        WHERE id = ANY($1)
        ORDER BY id ASC
        FOR UPDATE
        "#,
    )
    .bind(ids.to_vec())
    .fetch_all(&mut *conn)
    .await?;

    Ok(slots)
}

pub async fn find_held_slot_id(
    conn: &mut PgConnection,
    calendar_id: Uuid,
    person_id: Uuid,
) -> Result<Option<Uuid>> {
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT id
        FROM slot_instances
        WHERE calendar_id = $1 AND holder_id = $2
        "#,
    )
    .bind(calendar_id)
    .bind(person_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(id)
}

/// Returns `false` when the one-hold-per-calendar index rejects the update.
pub async fn set_slot_holder(
    conn: &mut PgConnection,
    slot_id: Uuid,
    person_id: Uuid,
    reserved_at: DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE slot_instances
        SET holder_id = $2, reserved_at = $3
        WHERE id = $1
        "#,
    )
    .bind(slot_id)
    .bind(person_id)
    .bind(reserved_at)
    .execute(&mut *conn)
    .await;

    match result {
        Ok(_) => Ok(true),
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
            tracing::debug!("Hold rejected by unique index: slot_id={}, person_id={}", slot_id, person_id);
            Ok(false)
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn clear_slot_holder(conn: &mut PgConnection, slot_id: Uuid) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE slot_instances
        SET holder_id = NULL, reserved_at = NULL
        WHERE id = $1
        "#,
    )
    .bind(slot_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
