//! # Teacher Schedule Handlers
//!
//! Weekly availability windows and absolute-time blocks. Availability updates
//! replace the teacher's full window set atomically; existing slots are not
//! re-validated against the new windows (bookings already made stand).

use axum::{
    Json,
    extract::{Path, State},
};
use lessonsync_core::{
    errors::LessonError,
    models::availability::{
        AvailabilityWindow, BlockedTime, CreateBlockedTimeRequest, UpdateAvailabilityRequest,
        UpdateAvailabilityResponse,
    },
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{ApiState, middleware::error_handling::AppError};

#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<Arc<ApiState>>,
    Path(teacher_id): Path<Uuid>,
) -> Result<Json<Vec<AvailabilityWindow>>, AppError> {
    let windows = lessonsync_db::repositories::availability::get_windows_for_teacher(
        &state.db_pool,
        teacher_id,
    )
    .await?;

    Ok(Json(windows.into_iter().map(|w| w.into_model()).collect()))
}

/// Replaces the teacher's full weekly window set in one transaction.
#[axum::debug_handler]
pub async fn update_availability(
    State(state): State<Arc<ApiState>>,
    Path(teacher_id): Path<Uuid>,
    Json(payload): Json<UpdateAvailabilityRequest>,
) -> Result<Json<UpdateAvailabilityResponse>, AppError> {
    for window in &payload.windows {
        validate_window(window)?;
    }

    let mut tx = state
        .db_pool
        .begin()
        .await
        .map_err(|e| LessonError::Database(e.into()))?;

    let windows_saved = lessonsync_db::repositories::availability::replace_windows(
        &mut tx,
        teacher_id,
        &payload.windows,
    )
    .await?;

    tx.commit().await.map_err(|e| LessonError::Database(e.into()))?;

    tracing::info!(
        "Replaced availability for teacher {}: {} windows",
        teacher_id,
        windows_saved
    );

    Ok(Json(UpdateAvailabilityResponse { windows_saved }))
}

#[axum::debug_handler]
pub async fn create_blocked_time(
    State(state): State<Arc<ApiState>>,
    Path(teacher_id): Path<Uuid>,
    Json(payload): Json<CreateBlockedTimeRequest>,
) -> Result<Json<BlockedTime>, AppError> {
    if payload.end_time <= payload.start_time {
        return Err(AppError(LessonError::Validation(
            "Blocked time must end after it starts".to_string(),
        )));
    }

    let blocked = lessonsync_db::repositories::availability::create_blocked_time(
        &state.db_pool,
        teacher_id,
        payload.start_time,
        payload.end_time,
        payload.reason.as_deref(),
    )
    .await?;

    Ok(Json(blocked.into_model()))
}

fn validate_window(window: &AvailabilityWindow) -> Result<(), AppError> {
    if window.day_of_week > 6 {
        return Err(AppError(LessonError::Validation(format!(
            "day_of_week must be 0-6 (Monday-Sunday), got {}",
            window.day_of_week
        ))));
    }
    if window.end_time <= window.start_time {
        return Err(AppError(LessonError::Validation(
            "Availability window must end after it starts".to_string(),
        )));
    }
    Ok(())
}
