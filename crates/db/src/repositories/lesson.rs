use crate::models::DbLesson;
use chrono::{DateTime, Utc};
use eyre::Result;
use lessonsync_core::errors::{LessonError, LessonResult};
use lessonsync_core::models::lesson::LessonPatch;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

const LESSON_COLUMNS: &str = "id, slot_id, teacher_id, student_id, date, duration_minutes, \
     status, is_recurring, notes, version, created_at";

/// Inserts a scheduled lesson for a slot occurrence unless one already exists
/// for the `(slot_id, date)` pair. Returns `None` when the occurrence was
/// already generated, which is what makes generation runs idempotent and safe
/// under concurrent invocation.
pub async fn insert_lesson_if_absent(
    executor: impl PgExecutor<'_>,
    slot_id: Uuid,
    teacher_id: Uuid,
    student_id: Uuid,
    date: DateTime<Utc>,
    duration_minutes: i16,
) -> Result<Option<DbLesson>> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let lesson = sqlx::query_as::<_, DbLesson>(&format!(
        r#"
        INSERT INTO lessons
            (id, slot_id, teacher_id, student_id, date, duration_minutes,
             status, is_recurring, version, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, 'scheduled', TRUE, 1, $7)
        ON CONFLICT (slot_id, date) DO NOTHING
        RETURNING {LESSON_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(slot_id)
    .bind(teacher_id)
    .bind(student_id)
    .bind(date)
    .bind(duration_minutes)
    .bind(now)
    .fetch_optional(executor)
    .await?;

    Ok(lesson)
}

pub async fn get_lesson_by_id(
    executor: impl PgExecutor<'_>,
    id: Uuid,
) -> Result<Option<DbLesson>> {
    let lesson = sqlx::query_as::<_, DbLesson>(&format!(
        r#"
        SELECT {LESSON_COLUMNS}
        FROM lessons
        WHERE id = $1
        "#
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(lesson)
}

pub async fn get_scheduled_lessons_in_range(
    executor: impl PgExecutor<'_>,
    teacher_id: Uuid,
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
) -> Result<Vec<DbLesson>> {
    let lessons = sqlx::query_as::<_, DbLesson>(&format!(
        r#"
        SELECT {LESSON_COLUMNS}
        FROM lessons
        WHERE teacher_id = $1
          AND status = 'scheduled'
          AND date >= $2
          AND date < $3
        ORDER BY date
        "#
    ))
    .bind(teacher_id)
    .bind(range_start)
    .bind(range_end)
    .fetch_all(executor)
    .await?;

    Ok(lessons)
}

/// Cancels all scheduled lessons of a slot from the effective date on.
/// Past or completed lessons are untouched.
pub async fn cancel_scheduled_lessons_from(
    executor: impl PgExecutor<'_>,
    slot_id: Uuid,
    effective_date: DateTime<Utc>,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE lessons
        SET status = 'cancelled', version = version + 1
        WHERE slot_id = $1 AND status = 'scheduled' AND date >= $2
        "#,
    )
    .bind(slot_id)
    .bind(effective_date)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

/// Single atomic conditional write: the row is updated only when `version`
/// still matches the caller's read, and the version counter advances with the
/// write. Zero affected rows means another editor got there first, reported
/// as [`LessonError::VersionConflict`] with the current counter.
pub async fn update_lesson_with_version(
    pool: &PgPool,
    id: Uuid,
    expected_version: i64,
    patch: &LessonPatch,
) -> LessonResult<DbLesson> {
    let updated = sqlx::query_as::<_, DbLesson>(&format!(
        r#"
        UPDATE lessons
        SET notes = COALESCE($3, notes),
            status = COALESCE($4, status),
            version = version + 1
        WHERE id = $1 AND version = $2
        RETURNING {LESSON_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(expected_version)
    .bind(patch.notes.as_deref())
    .bind(patch.status.map(|s| s.as_str()))
    .fetch_optional(pool)
    .await
    .map_err(|e| LessonError::Database(e.into()))?;

    if let Some(lesson) = updated {
        return Ok(lesson);
    }

    // No row matched: either the lesson is gone or the version is stale
    let current = get_lesson_by_id(pool, id)
        .await
        .map_err(LessonError::Database)?;
    match current {
        Some(lesson) => Err(LessonError::VersionConflict {
            current_version: lesson.version,
            attempted_version: expected_version,
        }),
        None => Err(LessonError::NotFound(format!(
            "Lesson with ID {id} not found"
        ))),
    }
}

/// Linearly growing pause between optimistic-lock retry attempts, so
/// concurrent retriers fall out of lockstep.
pub fn retry_delay(attempt: u32) -> std::time::Duration {
    std::time::Duration::from_millis(25 * u64::from(attempt))
}

/// Bounded optimistic-lock retry for system-driven mutations.
///
/// The patch is re-derived from the freshly fetched row on every attempt, so
/// the caller's intent (not stale field values) is what gets re-applied; the
/// intent may refuse to produce a patch, which aborts the loop. Attempts are
/// separated by a growing backoff pause. After `max_attempts` conflicts the
/// last conflict surfaces to the caller.
pub async fn update_lesson_with_retry<F>(
    pool: &PgPool,
    id: Uuid,
    max_attempts: u32,
    intent: F,
) -> LessonResult<DbLesson>
where
    F: Fn(&DbLesson) -> LessonResult<LessonPatch>,
{
    let mut last_conflict = None;
    let max_attempts = max_attempts.max(1);

    for attempt in 1..=max_attempts {
        let current = get_lesson_by_id(pool, id)
            .await
            .map_err(LessonError::Database)?
            .ok_or_else(|| LessonError::NotFound(format!("Lesson with ID {id} not found")))?;

        let patch = intent(&current)?;
        match update_lesson_with_version(pool, id, current.version, &patch).await {
            Ok(lesson) => return Ok(lesson),
            Err(conflict @ LessonError::VersionConflict { .. }) => {
                tracing::debug!(
                    "Optimistic lock conflict on lesson {} (attempt {}/{})",
                    id,
                    attempt,
                    max_attempts
                );
                last_conflict = Some(conflict);
                if attempt < max_attempts {
                    tokio::time::sleep(retry_delay(attempt)).await;
                }
            }
            Err(other) => return Err(other),
        }
    }

    Err(last_conflict.unwrap_or_else(|| {
        LessonError::Internal("Retry loop ended without a result".to_string().into())
    }))
}
