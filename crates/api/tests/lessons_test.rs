use chrono::Utc;
use lessonsync_api::handlers::lessons::completion_patch;
use lessonsync_core::errors::LessonError;
use lessonsync_core::models::lesson::LessonStatus;
use lessonsync_db::models::DbLesson;
use pretty_assertions::assert_eq;
use uuid::Uuid;

fn lesson_with_status(status: &str) -> DbLesson {
    DbLesson {
        id: Uuid::new_v4(),
        slot_id: Some(Uuid::new_v4()),
        teacher_id: Uuid::new_v4(),
        student_id: Uuid::new_v4(),
        date: Utc::now(),
        duration_minutes: 60,
        status: status.to_string(),
        is_recurring: true,
        notes: None,
        version: 1,
        created_at: Utc::now(),
    }
}

#[test]
fn test_completion_patch_marks_scheduled_lesson_completed() {
    let patch =
        completion_patch(&lesson_with_status("scheduled")).expect("scheduled lesson is completable");

    assert_eq!(patch.status, Some(LessonStatus::Completed));
    assert_eq!(patch.notes, None);
}

#[test]
fn test_completion_patch_refuses_lesson_cancelled_under_its_feet() {
    // A cancellation landing between the caller's pre-check and the retry's
    // re-fetch must abort the retry, not get flipped to completed
    let error = completion_patch(&lesson_with_status("cancelled")).unwrap_err();

    match error {
        LessonError::Validation(detail) => assert!(detail.contains("cancelled")),
        other => panic!("expected a validation error, got {other}"),
    }
}

#[test]
fn test_completion_patch_refuses_already_completed_lesson() {
    // The concurrent completer already bumped the billing counter once
    let error = completion_patch(&lesson_with_status("completed")).unwrap_err();

    assert!(matches!(error, LessonError::Validation(_)));
}
