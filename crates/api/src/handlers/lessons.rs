//! # Lesson Handlers
//!
//! Reads and mutations for individual lessons. Mutations go through the
//! optimistic-lock counter: the caller-facing update endpoint requires the
//! version the caller last read and never retries on its behalf, while the
//! completion endpoint is system-driven and retries a bounded number of times
//! with a freshly derived patch.

use axum::{
    Json,
    extract::{Path, State},
};
use lessonsync_core::{
    calendar::BillingMonth,
    errors::{LessonError, LessonResult},
    models::lesson::{LessonPatch, LessonResponse, LessonStatus, UpdateLessonRequest},
};
use lessonsync_db::models::DbLesson;
use std::sync::Arc;
use uuid::Uuid;

use crate::{ApiState, middleware::error_handling::AppError};

const COMPLETE_MAX_ATTEMPTS: u32 = 3;

#[axum::debug_handler]
pub async fn get_lesson(
    State(state): State<Arc<ApiState>>,
    Path(lesson_id): Path<Uuid>,
) -> Result<Json<LessonResponse>, AppError> {
    let lesson = lessonsync_db::repositories::lesson::get_lesson_by_id(&state.db_pool, lesson_id)
        .await?
        .ok_or_else(|| LessonError::NotFound(format!("Lesson with ID {lesson_id} not found")))?;

    Ok(Json(lesson.into_model()?))
}

/// Applies a caller-supplied patch under optimistic locking.
///
/// The caller sends the version it last read; a stale version comes back as a
/// 409 carrying both counters, and the caller decides whether to re-read and
/// retry. The server never retries a caller-supplied version on its own.
#[axum::debug_handler]
pub async fn update_lesson(
    State(state): State<Arc<ApiState>>,
    Path(lesson_id): Path<Uuid>,
    Json(payload): Json<UpdateLessonRequest>,
) -> Result<Json<LessonResponse>, AppError> {
    let current =
        lessonsync_db::repositories::lesson::get_lesson_by_id(&state.db_pool, lesson_id)
            .await?
            .ok_or_else(|| {
                LessonError::NotFound(format!("Lesson with ID {lesson_id} not found"))
            })?;

    if let Some(next) = payload.patch.status {
        validate_status_change(&current, next)?;
    }

    let was_completed = current.status()? == LessonStatus::Completed;
    let updated = lessonsync_db::repositories::lesson::update_lesson_with_version(
        &state.db_pool,
        lesson_id,
        payload.expected_version,
        &payload.patch,
    )
    .await?;

    if !was_completed && updated.status()? == LessonStatus::Completed {
        record_completion(&state, &updated).await;
    }

    Ok(Json(updated.into_model()?))
}

/// Marks a lesson completed, retrying through concurrent note edits.
///
/// Idempotent: completing an already-completed lesson returns it unchanged.
#[axum::debug_handler]
pub async fn complete_lesson(
    State(state): State<Arc<ApiState>>,
    Path(lesson_id): Path<Uuid>,
) -> Result<Json<LessonResponse>, AppError> {
    let current =
        lessonsync_db::repositories::lesson::get_lesson_by_id(&state.db_pool, lesson_id)
            .await?
            .ok_or_else(|| {
                LessonError::NotFound(format!("Lesson with ID {lesson_id} not found"))
            })?;

    match current.status()? {
        LessonStatus::Completed => return Ok(Json(current.into_model()?)),
        LessonStatus::Cancelled => {
            return Err(AppError(LessonError::Validation(format!(
                "Lesson {lesson_id} is cancelled and cannot be completed"
            ))));
        }
        LessonStatus::Scheduled => {}
    }

    let updated = lessonsync_db::repositories::lesson::update_lesson_with_retry(
        &state.db_pool,
        lesson_id,
        COMPLETE_MAX_ATTEMPTS,
        completion_patch,
    )
    .await?;

    record_completion(&state, &updated).await;

    Ok(Json(updated.into_model()?))
}

/// Patch intent for completion, re-checked against the freshly fetched row on
/// every retry attempt. A lesson that left `scheduled` between the caller's
/// pre-check and the write aborts the retry instead of being overwritten.
pub fn completion_patch(current: &DbLesson) -> LessonResult<LessonPatch> {
    match current.status().map_err(LessonError::Database)? {
        LessonStatus::Scheduled => Ok(LessonPatch {
            notes: None,
            status: Some(LessonStatus::Completed),
        }),
        other => Err(LessonError::Validation(format!(
            "Lesson {} is {} and cannot be completed",
            current.id,
            other.as_str()
        ))),
    }
}

/// Bumps the completed-lesson counter on the billing record for the month the
/// lesson falls in. A missing subscription or billing record is fine; the
/// counter only exists once the monthly billing job has run. Failures are
/// logged and never fail the completion that already committed.
async fn record_completion(state: &ApiState, lesson: &DbLesson) {
    let Some(slot_id) = lesson.slot_id else {
        return;
    };

    let month = BillingMonth::containing(lesson.date.date_naive()).to_string();
    let outcome = async {
        let subscription = lessonsync_db::repositories::subscription::get_subscription_covering(
            &state.db_pool,
            slot_id,
            &month,
        )
        .await?;

        if let Some(subscription) = subscription {
            lessonsync_db::repositories::billing::increment_actual_lessons(
                &state.db_pool,
                subscription.id,
                &month,
            )
            .await?;
        }

        Ok::<_, eyre::Report>(())
    }
    .await;

    if let Err(error) = outcome {
        tracing::warn!(
            "Failed to record completion of lesson {} against billing month {}: {error}",
            lesson.id,
            month
        );
    }
}

fn validate_status_change(current: &DbLesson, next: LessonStatus) -> Result<(), AppError> {
    let from = current.status().map_err(LessonError::Database)?;
    let allowed = match (from, next) {
        (same_from, same_to) if same_from == same_to => true,
        (LessonStatus::Scheduled, _) => true,
        // Completed and cancelled lessons are terminal for status purposes
        _ => false,
    };

    if allowed {
        Ok(())
    } else {
        Err(AppError(LessonError::Validation(format!(
            "Cannot change lesson status from {} to {}",
            from.as_str(),
            next.as_str()
        ))))
    }
}
