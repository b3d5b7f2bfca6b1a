use crate::models::{DbCalendar, DbCalendarSummary};
use chrono::{NaiveDate, Utc};
use eyre::Result;
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

/// Inserts a calendar inside the caller's transaction. Returns `None` when the
/// provider already has one on `date`.
pub async fn insert_calendar(
    conn: &mut PgConnection,
    provider_id: Uuid,
    date: NaiveDate,
) -> Result<Option<DbCalendar>> {
    let id = Uuid::new_v4();

    tracing::debug!("Creating calendar: id={}, provider_id={}, date={}", id, provider_id, date);

    let calendar = sqlx::query_as::<_, DbCalendar>(
        r#"
        INSERT INTO calendars (id, provider_id, date, created_at)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (provider_id, date) DO NOTHING
        RETURNING id, provider_id, date, created_at
        "#,
    )
    .bind(id)
    .bind(provider_id)
    .bind(date)
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await?;

    Ok(calendar)
}

pub async fn get_calendar_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbCalendar>> {
    let calendar = sqlx::query_as::<_, DbCalendar>(
        r#"
        SELECT id, provider_id, date, created_at
        FROM calendars
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(calendar)
}

pub async fn get_calendar_by_provider_and_date(
    pool: &Pool<Postgres>,
    provider_id: Uuid,
    date: NaiveDate,
) -> Result<Option<DbCalendar>> {
    let calendar = sqlx::query_as::<_, DbCalendar>(
        r#"
        SELECT id, provider_id, date, created_at
        FROM calendars
        WHERE provider_id = $1 AND date = $2
        "#,
    )
    .bind(provider_id)
    .bind(date)
    .fetch_optional(pool)
    .await?;

    Ok(calendar)
}

pub async fn list_calendars_from(
    pool: &Pool<Postgres>,
    from: NaiveDate,
    provider_id: Option<Uuid>,
) -> Result<Vec<DbCalendarSummary>> {
    let calendars = sqlx::query_as::<_, DbCalendarSummary>(
        r#"
        SELECT c.id, c.provider_id, c.date, c.created_at,
               COUNT(s.id) FILTER (WHERE s.holder_id IS NULL) AS available,
               COUNT(s.id) AS total
        FROM calendars c
        LEFT JOIN slot_instances s ON s.calendar_id = c.id
        WHERE c.date >= $1
          AND ($2::uuid IS NULL OR c.provider_id = $2)
        GROUP BY c.id
        ORDER BY c.date ASC, c.provider_id ASC
        "#,
    )
    .bind(from)
    .bind(provider_id)
    .fetch_all(pool)
    .await?;

    Ok(calendars)
}
