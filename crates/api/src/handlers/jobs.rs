//! # Background Job Handlers
//!
//! Idempotent endpoints for the periodic work an external cron-like invoker
//! triggers: extending the lesson horizon, generating monthly billing, and
//! sweeping overdue invoices.
//!
//! Both generation loops isolate failures per unit of work (one teacher, one
//! subscription): a failing unit's error is collected into the response's
//! `errors` array and processing continues, so a single bad record never
//! aborts the whole run. Each teacher's generation runs in its own
//! transaction rather than one long-running transaction across all teachers.

use axum::{Json, extract::State};
use chrono::{Duration, NaiveDate};
use chrono_tz::Tz;
use eyre::eyre;
use lessonsync_core::{
    calendar,
    errors::LessonError,
    models::billing::{
        GenerateBillingRequest, GenerateBillingResponse, GenerateLessonsRequest,
        GenerateLessonsResponse, MarkOverdueRequest, MarkOverdueResponse, RatePlan,
    },
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{ApiState, middleware::error_handling::AppError};

/// Materializes lessons for every active slot over the requested range
/// (default: today through the configured horizon).
///
/// Safe to call repeatedly: the `(slot_id, date)` uniqueness check skips
/// occurrences that already have a lesson, so re-runs and overlapping ranges
/// create nothing new.
#[axum::debug_handler]
pub async fn generate_lessons(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<GenerateLessonsRequest>,
) -> Result<Json<GenerateLessonsResponse>, AppError> {
    let today = state.clock.now().date_naive();
    let range_start = payload.range_start.unwrap_or(today);
    let range_end = payload
        .range_end
        .unwrap_or(range_start + Duration::weeks(state.horizon_weeks));
    if range_end < range_start {
        return Err(AppError(LessonError::Validation(format!(
            "range_end {range_end} precedes range_start {range_start}"
        ))));
    }

    let teachers =
        lessonsync_db::repositories::slot::list_teachers_with_active_slots(&state.db_pool).await?;

    let mut lessons_generated = 0u64;
    let mut errors = Vec::new();

    for teacher_id in &teachers {
        match generate_for_teacher(&state, *teacher_id, range_start, range_end).await {
            Ok(count) => lessons_generated += count,
            Err(error) => {
                tracing::warn!("Lesson generation failed for teacher {}: {}", teacher_id, error);
                errors.push(format!("teacher {teacher_id}: {error}"));
            }
        }
    }

    let success = errors.is_empty();
    Ok(Json(GenerateLessonsResponse {
        lessons_generated,
        teachers_processed: teachers.len() as u64,
        errors,
        success,
    }))
}

/// One teacher's generation unit: a single transaction covering all their
/// active slots, occurrences in chronological order per slot.
async fn generate_for_teacher(
    state: &ApiState,
    teacher_id: Uuid,
    range_start: NaiveDate,
    range_end: NaiveDate,
) -> eyre::Result<u64> {
    let mut tx = state.db_pool.begin().await?;

    let slots =
        lessonsync_db::repositories::slot::get_active_slots_for_teacher(&mut *tx, teacher_id)
            .await?;

    let mut created = 0u64;
    for slot in slots {
        let day_of_week = calendar::weekday_from_index(slot.day_of_week as u8)
            .ok_or_else(|| eyre!("Slot {} has invalid day_of_week {}", slot.id, slot.day_of_week))?;
        let timezone: Tz = slot
            .timezone
            .parse()
            .map_err(|_| eyre!("Slot {} has invalid timezone '{}'", slot.id, slot.timezone))?;

        for occurrence in calendar::occurrences_in_range(
            day_of_week,
            slot.start_time,
            range_start,
            range_end,
            timezone,
        ) {
            let inserted = lessonsync_db::repositories::lesson::insert_lesson_if_absent(
                &mut *tx,
                slot.id,
                slot.teacher_id,
                slot.student_id,
                occurrence,
                slot.duration_minutes,
            )
            .await?;
            if inserted.is_some() {
                created += 1;
            }
        }
    }

    tx.commit().await?;
    tracing::info!("Generated {} lessons for teacher {}", created, teacher_id);
    Ok(created)
}

/// Creates pending billing records for every active subscription covering the
/// month. The `(subscription, month)` uniqueness makes re-runs no-ops.
#[axum::debug_handler]
pub async fn generate_billing(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<GenerateBillingRequest>,
) -> Result<Json<GenerateBillingResponse>, AppError> {
    let month = payload.month;
    let month_key = month.to_string();

    let subscriptions = lessonsync_db::repositories::subscription::list_billable_subscriptions(
        &state.db_pool,
        &month_key,
    )
    .await?;

    let mut billing_records_created = 0u64;
    let mut errors = Vec::new();

    for subscription in subscriptions {
        // Each subscription is its own unit of work; a bad rate configuration
        // or insert failure is reported without stopping the run
        let result = async {
            let day_of_week = calendar::weekday_from_index(subscription.day_of_week as u8)
                .ok_or_else(|| {
                    eyre!(
                        "Subscription {} slot has invalid day_of_week {}",
                        subscription.id,
                        subscription.day_of_week
                    )
                })?;
            let expected_lessons = calendar::occurrence_count_in_month(day_of_week, month);
            let rate_plan = RatePlan::from_fields(
                subscription.monthly_rate_cents,
                subscription.rate_per_lesson_cents,
            )
            .map_err(|e| eyre!("Subscription {}: {}", subscription.id, e))?;

            lessonsync_db::repositories::billing::insert_billing_if_absent(
                &state.db_pool,
                subscription.id,
                subscription.student_id,
                subscription.teacher_id,
                &month_key,
                expected_lessons as i32,
                rate_plan.rate_per_lesson(),
                rate_plan.total_for(expected_lessons),
            )
            .await
        }
        .await;

        match result {
            Ok(Some(_)) => billing_records_created += 1,
            // Already billed for this month; idempotent skip
            Ok(None) => {}
            Err(error) => {
                tracing::warn!(
                    "Billing generation failed for subscription {}: {}",
                    subscription.id,
                    error
                );
                errors.push(format!("subscription {}: {}", subscription.id, error));
            }
        }
    }

    let success = errors.is_empty();
    Ok(Json(GenerateBillingResponse {
        billing_records_created,
        errors,
        success,
    }))
}

/// Flips billed records from months before `as_of` to overdue.
#[axum::debug_handler]
pub async fn mark_overdue(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<MarkOverdueRequest>,
) -> Result<Json<MarkOverdueResponse>, AppError> {
    let marked_overdue = lessonsync_db::repositories::billing::mark_overdue_before(
        &state.db_pool,
        &payload.as_of.to_string(),
    )
    .await?;

    if marked_overdue > 0 {
        tracing::info!("Marked {} billing records overdue", marked_overdue);
    }

    Ok(Json(MarkOverdueResponse { marked_overdue }))
}
