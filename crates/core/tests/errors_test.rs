use std::error::Error;

use lessonsync_core::conflict::{BookingDenied, DenialReason};
use lessonsync_core::errors::{LessonError, LessonResult};
use pretty_assertions::assert_eq;

#[test]
fn test_lesson_error_display() {
    let not_found = LessonError::NotFound("Lesson not found".to_string());
    let validation = LessonError::Validation("Invalid input".to_string());
    let conflict = LessonError::BookingConflict {
        reason: DenialReason::Blocked,
        detail: "Teacher is on vacation".to_string(),
    };
    let database = LessonError::Database(eyre::eyre!("Database connection failed"));
    let internal = LessonError::Internal(Box::new(std::io::Error::new(
        std::io::ErrorKind::Other,
        "Internal error",
    )));

    assert_eq!(not_found.to_string(), "Resource not found: Lesson not found");
    assert_eq!(validation.to_string(), "Validation error: Invalid input");
    assert_eq!(
        conflict.to_string(),
        "Booking conflict [BLOCKED]: Teacher is on vacation"
    );
    assert!(database.to_string().contains("Database error:"));
    assert!(internal.to_string().contains("Internal server error:"));
}

#[test]
fn test_version_conflict_reports_both_counters() {
    let conflict = LessonError::VersionConflict {
        current_version: 5,
        attempted_version: 3,
    };

    assert_eq!(
        conflict.to_string(),
        "Lesson was modified by someone else (current version 5, attempted 3)"
    );
}

#[test]
fn test_denial_reason_codes() {
    assert_eq!(DenialReason::NotAvailable.to_string(), "NOT_AVAILABLE");
    assert_eq!(DenialReason::Blocked.to_string(), "BLOCKED");
    assert_eq!(DenialReason::Conflict.to_string(), "CONFLICT");
    assert_eq!(DenialReason::OutOfWindow.to_string(), "OUT_OF_WINDOW");

    // The wire form matches the display form
    assert_eq!(
        serde_json::to_string(&DenialReason::OutOfWindow).expect("serialize"),
        "\"OUT_OF_WINDOW\""
    );
}

#[test]
fn test_booking_denied_converts_to_error() {
    let denied = BookingDenied {
        reason: DenialReason::Conflict,
        detail: "Overlaps an existing weekly slot".to_string(),
    };

    let error: LessonError = denied.into();
    match error {
        LessonError::BookingConflict { reason, detail } => {
            assert_eq!(reason, DenialReason::Conflict);
            assert_eq!(detail, "Overlaps an existing weekly slot");
        }
        other => panic!("Expected BookingConflict, got {other}"),
    }
}

#[test]
fn test_internal_error_preserves_source() {
    let io_error = std::io::Error::new(std::io::ErrorKind::Other, "IO error");
    let error = LessonError::Internal(Box::new(io_error));

    assert!(error.source().is_some());
}

#[test]
fn test_lesson_result() {
    let result: LessonResult<i32> = Ok(42);
    assert_eq!(result.unwrap(), 42);

    let result: LessonResult<i32> = Err(LessonError::NotFound("Not found".to_string()));
    assert!(result.is_err());
}
