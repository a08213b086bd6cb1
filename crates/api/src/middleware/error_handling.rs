//! # Error Handling Middleware
//!
//! This module provides a standardized way to handle errors in the LessonSync
//! API. It maps domain-specific errors to appropriate HTTP status codes and
//! JSON error responses, ensuring a consistent error handling experience
//! across the entire API.
//!
//! Conflict responses carry the detail a caller needs to resolve them: the
//! reason code for a denied booking, both version counters for an optimistic
//! lock conflict. Infrastructure errors are logged in full but surface only a
//! generic message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use lessonsync_core::errors::LessonError;
use serde_json::json;

/// Application error wrapper that provides HTTP status code mapping
///
/// `AppError` wraps domain-specific [`LessonError`] instances and implements
/// `IntoResponse` to convert them into HTTP responses with appropriate
/// status codes and JSON payloads.
#[derive(Debug)]
pub struct AppError(pub LessonError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self.0 {
            LessonError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                json!({ "error": self.0.to_string() }),
            ),
            LessonError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": self.0.to_string() }),
            ),
            LessonError::BookingConflict { reason, .. } => (
                StatusCode::CONFLICT,
                json!({
                    "error": self.0.to_string(),
                    "reason": reason,
                }),
            ),
            LessonError::VersionConflict {
                current_version,
                attempted_version,
            } => (
                StatusCode::CONFLICT,
                json!({
                    "error": "Lesson was modified by someone else, please refresh",
                    "current_version": current_version,
                    "attempted_version": attempted_version,
                }),
            ),
            LessonError::Database(report) => {
                tracing::error!("Database error: {:?}", report);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
            LessonError::Internal(error) => {
                tracing::error!("Internal error: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Automatic conversion from LessonError to AppError
///
/// This implementation allows using `?` operator with functions that return
/// `Result<T, LessonError>` in handler functions that return
/// `Result<T, AppError>`.
impl From<LessonError> for AppError {
    fn from(err: LessonError) -> Self {
        AppError(err)
    }
}

/// Automatic conversion from eyre::Report to AppError
///
/// Repository functions return `eyre::Result`; this wraps their failures in
/// the `Database` variant so handlers can use the `?` operator directly.
impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(LessonError::Database(err))
    }
}
