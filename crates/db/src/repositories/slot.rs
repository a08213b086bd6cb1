use crate::models::DbRecurringSlot;
use chrono::{DateTime, NaiveTime, Utc};
use eyre::Result;
use sqlx::PgExecutor;
use uuid::Uuid;

const SLOT_COLUMNS: &str = "id, teacher_id, student_id, day_of_week, start_time, duration_minutes, \
     timezone, monthly_rate_cents, rate_per_lesson_cents, status, booked_at, cancelled_at";

/// Inserts an active slot, returning `None` when the partial unique index on
/// the active `(teacher, weekday, start, duration)` tuple rejects it. That
/// index is the final backstop against a concurrent booking for the same time.
#[allow(clippy::too_many_arguments)]
pub async fn create_slot(
    executor: impl PgExecutor<'_>,
    teacher_id: Uuid,
    student_id: Uuid,
    day_of_week: i16,
    start_time: NaiveTime,
    duration_minutes: i16,
    timezone: &str,
    monthly_rate_cents: Option<i64>,
    rate_per_lesson_cents: Option<i64>,
) -> Result<Option<DbRecurringSlot>> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    tracing::debug!(
        "Creating recurring slot: id={}, teacher={}, day={}, start={}",
        id,
        teacher_id,
        day_of_week,
        start_time
    );

    let slot = sqlx::query_as::<_, DbRecurringSlot>(&format!(
        r#"
        INSERT INTO recurring_slots
            (id, teacher_id, student_id, day_of_week, start_time, duration_minutes,
             timezone, monthly_rate_cents, rate_per_lesson_cents, status, booked_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'active', $10)
        ON CONFLICT (teacher_id, day_of_week, start_time, duration_minutes)
            WHERE status = 'active'
            DO NOTHING
        RETURNING {SLOT_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(teacher_id)
    .bind(student_id)
    .bind(day_of_week)
    .bind(start_time)
    .bind(duration_minutes)
    .bind(timezone)
    .bind(monthly_rate_cents)
    .bind(rate_per_lesson_cents)
    .bind(now)
    .fetch_optional(executor)
    .await?;

    Ok(slot)
}

pub async fn get_slot_by_id(
    executor: impl PgExecutor<'_>,
    id: Uuid,
) -> Result<Option<DbRecurringSlot>> {
    let slot = sqlx::query_as::<_, DbRecurringSlot>(&format!(
        r#"
        SELECT {SLOT_COLUMNS}
        FROM recurring_slots
        WHERE id = $1
        "#
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(slot)
}

pub async fn get_active_slots_for_teacher(
    executor: impl PgExecutor<'_>,
    teacher_id: Uuid,
) -> Result<Vec<DbRecurringSlot>> {
    let slots = sqlx::query_as::<_, DbRecurringSlot>(&format!(
        r#"
        SELECT {SLOT_COLUMNS}
        FROM recurring_slots
        WHERE teacher_id = $1 AND status = 'active'
        ORDER BY day_of_week, start_time
        "#
    ))
    .bind(teacher_id)
    .fetch_all(executor)
    .await?;

    Ok(slots)
}

pub async fn list_teachers_with_active_slots(
    executor: impl PgExecutor<'_>,
) -> Result<Vec<Uuid>> {
    let teacher_ids = sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT DISTINCT teacher_id
        FROM recurring_slots
        WHERE status = 'active'
        ORDER BY teacher_id
        "#,
    )
    .fetch_all(executor)
    .await?;

    Ok(teacher_ids)
}

/// Unconditional status write; transition validity is checked by the caller
/// against `SlotStatus::can_transition_to`.
pub async fn set_slot_status(
    executor: impl PgExecutor<'_>,
    id: Uuid,
    status: &str,
    cancelled_at: Option<DateTime<Utc>>,
) -> Result<Option<DbRecurringSlot>> {
    tracing::debug!("Setting slot {} status to {}", id, status);

    let slot = sqlx::query_as::<_, DbRecurringSlot>(&format!(
        r#"
        UPDATE recurring_slots
        SET status = $2, cancelled_at = COALESCE($3, cancelled_at)
        WHERE id = $1
        RETURNING {SLOT_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(status)
    .bind(cancelled_at)
    .fetch_optional(executor)
    .await?;

    Ok(slot)
}

pub async fn delete_slot(executor: impl PgExecutor<'_>, id: Uuid) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM recurring_slots
        WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

pub async fn count_lessons_for_slot(executor: impl PgExecutor<'_>, slot_id: Uuid) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM lessons WHERE slot_id = $1
        "#,
    )
    .bind(slot_id)
    .fetch_one(executor)
    .await?;

    Ok(count)
}
