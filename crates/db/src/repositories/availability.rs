use crate::models::{DbAvailabilityWindow, DbBlockedTime};
use chrono::{DateTime, Utc};
use eyre::Result;
use lessonsync_core::models::availability::AvailabilityWindow;
use sqlx::{PgExecutor, Postgres, Transaction};
use uuid::Uuid;

/// Replaces a teacher's full weekly window set: existing windows are deleted
/// and the new ones inserted in one transaction.
pub async fn replace_windows(
    tx: &mut Transaction<'_, Postgres>,
    teacher_id: Uuid,
    windows: &[AvailabilityWindow],
) -> Result<u64> {
    sqlx::query(
        r#"
        DELETE FROM teacher_availability
        WHERE teacher_id = $1
        "#,
    )
    .bind(teacher_id)
    .execute(&mut **tx)
    .await?;

    let mut saved = 0;
    for window in windows {
        sqlx::query(
            r#"
            INSERT INTO teacher_availability (id, teacher_id, day_of_week, start_time, end_time, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(teacher_id)
        .bind(window.day_of_week as i16)
        .bind(window.start_time)
        .bind(window.end_time)
        .bind(window.is_active)
        .execute(&mut **tx)
        .await?;
        saved += 1;
    }

    Ok(saved)
}

pub async fn get_windows_for_teacher(
    executor: impl PgExecutor<'_>,
    teacher_id: Uuid,
) -> Result<Vec<DbAvailabilityWindow>> {
    let windows = sqlx::query_as::<_, DbAvailabilityWindow>(
        r#"
        SELECT id, teacher_id, day_of_week, start_time, end_time, is_active
        FROM teacher_availability
        WHERE teacher_id = $1
        ORDER BY day_of_week, start_time
        "#,
    )
    .bind(teacher_id)
    .fetch_all(executor)
    .await?;

    Ok(windows)
}

pub async fn create_blocked_time(
    executor: impl PgExecutor<'_>,
    teacher_id: Uuid,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    reason: Option<&str>,
) -> Result<DbBlockedTime> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let blocked = sqlx::query_as::<_, DbBlockedTime>(
        r#"
        INSERT INTO blocked_times (id, teacher_id, start_time, end_time, reason, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, teacher_id, start_time, end_time, reason, created_at
        "#,
    )
    .bind(id)
    .bind(teacher_id)
    .bind(start_time)
    .bind(end_time)
    .bind(reason)
    .bind(now)
    .fetch_one(executor)
    .await?;

    Ok(blocked)
}

/// Blocked periods intersecting the given range.
pub async fn get_blocked_times_in_range(
    executor: impl PgExecutor<'_>,
    teacher_id: Uuid,
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
) -> Result<Vec<DbBlockedTime>> {
    let blocked = sqlx::query_as::<_, DbBlockedTime>(
        r#"
        SELECT id, teacher_id, start_time, end_time, reason, created_at
        FROM blocked_times
        WHERE teacher_id = $1 AND start_time < $3 AND end_time > $2
        ORDER BY start_time
        "#,
    )
    .bind(teacher_id)
    .bind(range_start)
    .bind(range_end)
    .fetch_all(executor)
    .await?;

    Ok(blocked)
}
