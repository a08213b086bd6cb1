//! # Billing Handlers
//!
//! Reads and lifecycle transitions for monthly billing records. Transitions
//! are guarded in SQL (the row only changes when it is still in the expected
//! state), so two concurrent requests cannot both succeed.

use axum::{
    Json,
    extract::{Path, State},
};
use lessonsync_core::{
    errors::LessonError,
    models::billing::{BillingResponse, BillingStatus},
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::{ApiState, email::send_quietly, middleware::error_handling::AppError};

#[axum::debug_handler]
pub async fn get_billing(
    State(state): State<Arc<ApiState>>,
    Path(billing_id): Path<Uuid>,
) -> Result<Json<BillingResponse>, AppError> {
    let billing =
        lessonsync_db::repositories::billing::get_billing_by_id(&state.db_pool, billing_id)
            .await?
            .ok_or_else(|| {
                LessonError::NotFound(format!("Billing record with ID {billing_id} not found"))
            })?;

    Ok(Json(billing.into_model()?))
}

/// Issues the invoice: pending becomes billed and the student is notified.
#[axum::debug_handler]
pub async fn mark_billed(
    State(state): State<Arc<ApiState>>,
    Path(billing_id): Path<Uuid>,
) -> Result<Json<BillingResponse>, AppError> {
    let billing = lessonsync_db::repositories::billing::transition_status(
        &state.db_pool,
        billing_id,
        BillingStatus::Pending.as_str(),
        BillingStatus::Billed.as_str(),
    )
    .await?;

    let Some(billing) = billing else {
        return Err(require_status(&state, billing_id, "pending").await);
    };

    let billing = billing.into_model()?;
    send_quietly(
        &state.mailer,
        "invoice_issued",
        &billing.student_id.to_string(),
        json!({
            "billing_id": billing.id,
            "month": billing.month,
            "total_amount_cents": billing.total_amount_cents,
        }),
    )
    .await;

    Ok(Json(billing))
}

/// Records payment for a billed or overdue record, stamping the payment time
/// from the injected clock.
#[axum::debug_handler]
pub async fn record_payment(
    State(state): State<Arc<ApiState>>,
    Path(billing_id): Path<Uuid>,
) -> Result<Json<BillingResponse>, AppError> {
    let paid_at = state.clock.now();
    let billing =
        lessonsync_db::repositories::billing::record_payment(&state.db_pool, billing_id, paid_at)
            .await?;

    let Some(billing) = billing else {
        return Err(require_status(&state, billing_id, "billed or overdue").await);
    };

    tracing::info!("Billing record {} paid at {}", billing_id, paid_at);
    Ok(Json(billing.into_model()?))
}

/// Distinguishes a missing record from one in the wrong state after a guarded
/// transition matched no row.
async fn require_status(state: &ApiState, billing_id: Uuid, wanted: &str) -> AppError {
    match lessonsync_db::repositories::billing::get_billing_by_id(&state.db_pool, billing_id).await
    {
        Ok(Some(billing)) => AppError(LessonError::Validation(format!(
            "Billing record {} is '{}', expected {}",
            billing_id, billing.status, wanted
        ))),
        Ok(None) => AppError(LessonError::NotFound(format!(
            "Billing record with ID {billing_id} not found"
        ))),
        Err(error) => AppError(LessonError::Database(error)),
    }
}
