//! # Booking Handlers
//!
//! This module owns the lifecycle of a recurring weekly slot: booking,
//! cancellation, suspension, and re-activation.
//!
//! ## Booking Algorithm
//!
//! Creating a booking works in three phases:
//!
//! 1. Validation: the request's weekday index, duration, timezone, and rate
//!    model are checked before anything is fetched
//! 2. Conflict check: the teacher's availability windows, blocked periods,
//!    committed slots, and scheduled lessons are loaded and the candidate is
//!    evaluated by the pure checker in `lessonsync_core::conflict`
//! 3. Committed write: the slot, its initial subscription, and the first
//!    horizon of lessons are created inside a single transaction, so a
//!    failure at any step leaves no partial state
//!
//! The pre-write conflict check is inherently racy under concurrent booking
//! attempts for the same time; the partial unique index on active slot tuples
//! is the final backstop, surfaced as a CONFLICT response when the insert
//! comes back empty.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{Duration, NaiveTime, Weekday};
use chrono_tz::Tz;
use lessonsync_core::{
    calendar::{self, BillingMonth},
    conflict::{self, Candidate, TimeRange, WeeklyCommitment},
    errors::LessonError,
    models::{
        billing::RatePlan,
        slot::{
            CancelBookingRequest, CancelBookingResponse, CreateBookingRequest,
            CreateBookingResponse, RecurringSlot, SlotStatus,
        },
    },
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::{ApiState, email::send_quietly, middleware::error_handling::AppError};

/// A booking request that passed structural validation.
#[derive(Debug, Clone)]
pub struct ValidatedBooking {
    pub day_of_week: Weekday,
    pub start_time: NaiveTime,
    pub duration_minutes: u16,
    pub timezone: Tz,
    pub rate_plan: RatePlan,
}

/// Structural validation of a booking request, before any data is fetched.
pub fn validate_booking(payload: &CreateBookingRequest) -> Result<ValidatedBooking, LessonError> {
    let day_of_week = calendar::weekday_from_index(payload.day_of_week).ok_or_else(|| {
        LessonError::Validation(format!(
            "day_of_week must be 0-6 (Monday-Sunday), got {}",
            payload.day_of_week
        ))
    })?;

    if payload.duration_minutes != 30 && payload.duration_minutes != 60 {
        return Err(LessonError::Validation(format!(
            "duration_minutes must be 30 or 60, got {}",
            payload.duration_minutes
        )));
    }

    // Lessons may not wrap past midnight; keeps wall-clock interval
    // comparisons well ordered
    let midnight_gap = Duration::days(1)
        - payload
            .start_time
            .signed_duration_since(NaiveTime::MIN);
    if Duration::minutes(i64::from(payload.duration_minutes)) > midnight_gap {
        return Err(LessonError::Validation(
            "Lesson may not extend past midnight".to_string(),
        ));
    }

    let timezone: Tz = payload
        .timezone
        .parse()
        .map_err(|_| LessonError::Validation(format!("Unknown timezone '{}'", payload.timezone)))?;

    let rate_plan = RatePlan::from_fields(payload.monthly_rate_cents, payload.rate_per_lesson_cents)
        .map_err(LessonError::Validation)?;

    Ok(ValidatedBooking {
        day_of_week,
        start_time: payload.start_time,
        duration_minutes: payload.duration_minutes,
        timezone,
        rate_plan,
    })
}

#[axum::debug_handler]
pub async fn create_booking(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<Json<CreateBookingResponse>, AppError> {
    // STEP 1: Structural validation
    let validated = validate_booking(&payload)?;

    // STEP 2: Conflict check against the teacher's current commitments
    let now = state.clock.now();
    let range_start = now.date_naive();
    let range_end = range_start + Duration::weeks(state.horizon_weeks);
    let occurrences = calendar::occurrences_in_range(
        validated.day_of_week,
        validated.start_time,
        range_start,
        range_end,
        validated.timezone,
    );

    let windows = lessonsync_db::repositories::availability::get_windows_for_teacher(
        &state.db_pool,
        payload.teacher_id,
    )
    .await?
    .into_iter()
    .map(|w| w.into_model())
    .collect::<Vec<_>>();

    let horizon_start = now;
    let horizon_end = now + Duration::weeks(state.horizon_weeks) + Duration::days(1);
    let blocked = lessonsync_db::repositories::availability::get_blocked_times_in_range(
        &state.db_pool,
        payload.teacher_id,
        horizon_start,
        horizon_end,
    )
    .await?
    .into_iter()
    .map(|b| b.into_model())
    .collect::<Vec<_>>();

    let committed = lessonsync_db::repositories::slot::get_active_slots_for_teacher(
        &state.db_pool,
        payload.teacher_id,
    )
    .await?
    .into_iter()
    .filter_map(|slot| {
        calendar::weekday_from_index(slot.day_of_week as u8).map(|day_of_week| WeeklyCommitment {
            day_of_week,
            start_time: slot.start_time,
            duration_minutes: slot.duration_minutes as u16,
        })
    })
    .collect::<Vec<_>>();

    let scheduled = lessonsync_db::repositories::lesson::get_scheduled_lessons_in_range(
        &state.db_pool,
        payload.teacher_id,
        horizon_start,
        horizon_end,
    )
    .await?
    .into_iter()
    .map(|lesson| TimeRange {
        start: lesson.date,
        end: lesson.date + Duration::minutes(i64::from(lesson.duration_minutes)),
    })
    .collect::<Vec<_>>();

    let candidate = Candidate {
        day_of_week: validated.day_of_week,
        start_time: validated.start_time,
        duration_minutes: validated.duration_minutes,
        occurrences,
    };
    conflict::check_candidate(
        &candidate,
        &windows,
        &blocked,
        &committed,
        &scheduled,
        &state.policy,
        now,
    )
    .map_err(LessonError::from)?;

    // STEP 3: Slot + subscription + first lessons in one transaction
    let mut tx = state.db_pool.begin().await.map_err(eyre::Report::from)?;

    let slot = lessonsync_db::repositories::slot::create_slot(
        &mut *tx,
        payload.teacher_id,
        payload.student_id,
        i16::from(payload.day_of_week),
        payload.start_time,
        payload.duration_minutes as i16,
        &payload.timezone,
        payload.monthly_rate_cents,
        payload.rate_per_lesson_cents,
    )
    .await?
    .ok_or_else(|| {
        // The partial unique index caught a concurrent booking for the
        // same tuple
        LessonError::BookingConflict {
            reason: conflict::DenialReason::Conflict,
            detail: "An active slot already exists for this teacher, day, and time".to_string(),
        }
    })?;

    let subscription = lessonsync_db::repositories::subscription::create_subscription(
        &mut *tx,
        slot.id,
        payload.student_id,
        &payload.start_month.to_string(),
        payload.monthly_rate_cents,
        payload.rate_per_lesson_cents,
    )
    .await?;

    let mut lessons = Vec::with_capacity(candidate.occurrences.len());
    for occurrence in &candidate.occurrences {
        if let Some(lesson) = lessonsync_db::repositories::lesson::insert_lesson_if_absent(
            &mut *tx,
            slot.id,
            slot.teacher_id,
            slot.student_id,
            *occurrence,
            slot.duration_minutes,
        )
        .await?
        {
            lessons.push(lesson.into_model()?);
        }
    }

    tx.commit().await.map_err(eyre::Report::from)?;

    let slot: RecurringSlot = slot.into_model()?;
    let subscription = subscription.into_model()?;

    // Confirmation email is fire-and-forget; a delivery failure never fails
    // the booking
    send_quietly(
        &state.mailer,
        "booking_confirmed",
        &slot.student_id.to_string(),
        json!({
            "slot_id": slot.id,
            "teacher_id": slot.teacher_id,
            "day_of_week": slot.day_of_week,
            "start_time": slot.start_time,
            "lessons_scheduled": lessons.len(),
        }),
    )
    .await;

    Ok(Json(CreateBookingResponse {
        slot,
        subscription,
        lessons,
    }))
}

#[axum::debug_handler]
pub async fn cancel_booking(
    State(state): State<Arc<ApiState>>,
    Path(slot_id): Path<Uuid>,
    Json(payload): Json<CancelBookingRequest>,
) -> Result<Json<CancelBookingResponse>, AppError> {
    let slot = lessonsync_db::repositories::slot::get_slot_by_id(&state.db_pool, slot_id)
        .await?
        .ok_or_else(|| LessonError::NotFound(format!("Slot with ID {slot_id} not found")))?;

    let status = slot.status()?;
    if !status.can_transition_to(SlotStatus::Cancelled) {
        return Err(AppError(LessonError::Validation(format!(
            "Slot is already {} and cannot be cancelled",
            status.as_str()
        ))));
    }

    let now = state.clock.now();
    let end_month = BillingMonth::containing(payload.effective_date.date_naive()).to_string();

    let mut tx = state.db_pool.begin().await.map_err(eyre::Report::from)?;

    let lesson_count =
        lessonsync_db::repositories::slot::count_lessons_for_slot(&mut *tx, slot_id).await?;

    let (slots_removed, lessons_cancelled) = if lesson_count == 0 {
        // Nothing ever referenced this slot; remove it and its billing trail
        // outright
        if let Some(subscription) =
            lessonsync_db::repositories::subscription::get_active_subscription_for_slot(
                &mut *tx, slot_id,
            )
            .await?
        {
            lessonsync_db::repositories::billing::delete_billing_for_subscription(
                &mut *tx,
                subscription.id,
            )
            .await?;
        }
        lessonsync_db::repositories::subscription::delete_subscriptions_for_slot(&mut *tx, slot_id)
            .await?;
        let removed = lessonsync_db::repositories::slot::delete_slot(&mut *tx, slot_id).await?;
        (removed, 0)
    } else {
        lessonsync_db::repositories::slot::set_slot_status(
            &mut *tx,
            slot_id,
            SlotStatus::Cancelled.as_str(),
            Some(now),
        )
        .await?;

        let cancelled = lessonsync_db::repositories::lesson::cancel_scheduled_lessons_from(
            &mut *tx,
            slot_id,
            payload.effective_date,
        )
        .await?;

        if let Some(subscription) =
            lessonsync_db::repositories::subscription::get_active_subscription_for_slot(
                &mut *tx, slot_id,
            )
            .await?
        {
            lessonsync_db::repositories::subscription::close_subscription(
                &mut *tx,
                subscription.id,
                &end_month,
            )
            .await?;
            lessonsync_db::repositories::billing::cancel_billing_after_month(
                &mut *tx,
                subscription.id,
                &end_month,
            )
            .await?;
        }

        (0, cancelled)
    };

    tx.commit().await.map_err(eyre::Report::from)?;

    send_quietly(
        &state.mailer,
        "booking_cancelled",
        &slot.student_id.to_string(),
        json!({
            "slot_id": slot_id,
            "effective_date": payload.effective_date,
            "lessons_cancelled": lessons_cancelled,
        }),
    )
    .await;

    Ok(Json(CancelBookingResponse {
        slots_removed,
        lessons_cancelled,
    }))
}

#[axum::debug_handler]
pub async fn suspend_booking(
    State(state): State<Arc<ApiState>>,
    Path(slot_id): Path<Uuid>,
) -> Result<Json<RecurringSlot>, AppError> {
    transition_slot(&state, slot_id, SlotStatus::Suspended).await
}

#[axum::debug_handler]
pub async fn resume_booking(
    State(state): State<Arc<ApiState>>,
    Path(slot_id): Path<Uuid>,
) -> Result<Json<RecurringSlot>, AppError> {
    transition_slot(&state, slot_id, SlotStatus::Active).await
}

async fn transition_slot(
    state: &ApiState,
    slot_id: Uuid,
    next: SlotStatus,
) -> Result<Json<RecurringSlot>, AppError> {
    let slot = lessonsync_db::repositories::slot::get_slot_by_id(&state.db_pool, slot_id)
        .await?
        .ok_or_else(|| LessonError::NotFound(format!("Slot with ID {slot_id} not found")))?;

    let status = slot.status()?;
    if !status.can_transition_to(next) {
        return Err(AppError(LessonError::Validation(format!(
            "Slot cannot go from {} to {}",
            status.as_str(),
            next.as_str()
        ))));
    }

    let updated = lessonsync_db::repositories::slot::set_slot_status(
        &state.db_pool,
        slot_id,
        next.as_str(),
        None,
    )
    .await?
    .ok_or_else(|| LessonError::NotFound(format!("Slot with ID {slot_id} not found")))?;

    Ok(Json(updated.into_model()?))
}
