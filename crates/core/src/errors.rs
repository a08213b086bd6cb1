use thiserror::Error;

use crate::conflict::DenialReason;

#[derive(Error, Debug)]
pub enum LessonError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Booking conflict [{reason}]: {detail}")]
    BookingConflict { reason: DenialReason, detail: String },

    #[error("Lesson was modified by someone else (current version {current_version}, attempted {attempted_version})")]
    VersionConflict {
        current_version: i64,
        attempted_version: i64,
    },

    #[error("Database error: {0}")]
    Database(#[from] eyre::Report),

    #[error("Internal server error: {0}")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

pub type LessonResult<T> = Result<T, LessonError>;
