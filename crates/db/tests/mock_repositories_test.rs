use chrono::Utc;
use lessonsync_core::errors::LessonError;
use lessonsync_core::models::lesson::LessonPatch;
use lessonsync_db::mock::repositories::{MockBillingRepo, MockLessonRepo, MockSlotRepo};
use lessonsync_db::models::DbLesson;
use pretty_assertions::assert_eq;
use uuid::Uuid;

fn scheduled_lesson(id: Uuid, version: i64) -> DbLesson {
    DbLesson {
        id,
        slot_id: Some(Uuid::new_v4()),
        teacher_id: Uuid::new_v4(),
        student_id: Uuid::new_v4(),
        date: Utc::now(),
        duration_minutes: 60,
        status: "scheduled".to_string(),
        is_recurring: true,
        notes: None,
        version,
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_versioned_update_conflict_then_success() {
    let lesson_id = Uuid::new_v4();
    let mut repo = MockLessonRepo::new();

    // First writer raced us; the second attempt with the fresh version lands
    repo.expect_update_lesson_with_version()
        .times(1)
        .returning(|_, _, _| {
            Err(LessonError::VersionConflict {
                current_version: 2,
                attempted_version: 1,
            })
        });
    repo.expect_update_lesson_with_version()
        .times(1)
        .returning(move |id, expected_version, _| {
            assert_eq!(expected_version, 2);
            let mut lesson = scheduled_lesson(id, expected_version + 1);
            lesson.status = "completed".to_string();
            Ok(lesson)
        });

    let patch = LessonPatch {
        notes: None,
        status: Some(lessonsync_core::models::lesson::LessonStatus::Completed),
    };

    let first = repo
        .update_lesson_with_version(lesson_id, 1, patch.clone())
        .await;
    let conflict = first.expect_err("stale version must be rejected");
    match conflict {
        LessonError::VersionConflict {
            current_version, ..
        } => assert_eq!(current_version, 2),
        other => panic!("Expected version conflict, got {other}"),
    }

    let second = repo
        .update_lesson_with_version(lesson_id, 2, patch)
        .await
        .expect("fresh version succeeds");
    assert_eq!(second.version, 3);
    assert_eq!(second.status, "completed");
}

#[tokio::test]
async fn test_lesson_insert_skips_existing_occurrence() {
    let mut repo = MockLessonRepo::new();

    // Second call for the same (slot, date) pair reports nothing inserted
    let mut call = 0;
    repo.expect_insert_lesson_if_absent()
        .times(2)
        .returning(move |slot_id, _, _, _, _| {
            call += 1;
            if call == 1 {
                let mut lesson = scheduled_lesson(Uuid::new_v4(), 1);
                lesson.slot_id = Some(slot_id);
                Ok(Some(lesson))
            } else {
                Ok(None)
            }
        });

    let slot_id = Uuid::new_v4();
    let teacher_id = Uuid::new_v4();
    let student_id = Uuid::new_v4();
    let date = Utc::now();

    let first = repo
        .insert_lesson_if_absent(slot_id, teacher_id, student_id, date, 60)
        .await
        .expect("insert succeeds");
    assert!(first.is_some());

    let second = repo
        .insert_lesson_if_absent(slot_id, teacher_id, student_id, date, 60)
        .await
        .expect("insert succeeds");
    assert!(second.is_none());
}

#[tokio::test]
async fn test_billing_insert_idempotent_per_month() {
    let mut repo = MockBillingRepo::new();
    let subscription_id = Uuid::new_v4();

    repo.expect_insert_billing_if_absent()
        .times(1)
        .returning(|_, _, _, _| Ok(None));

    let result = repo
        .insert_billing_if_absent(subscription_id, "2024-05", 5, 15000)
        .await
        .expect("insert succeeds");
    assert!(result.is_none());
}

#[tokio::test]
async fn test_teacher_listing_for_generation() {
    let mut repo = MockSlotRepo::new();
    let teachers = vec![Uuid::new_v4(), Uuid::new_v4()];
    let expected = teachers.clone();

    repo.expect_list_teachers_with_active_slots()
        .times(1)
        .returning(move || Ok(teachers.clone()));

    let listed = repo
        .list_teachers_with_active_slots()
        .await
        .expect("listing succeeds");
    assert_eq!(listed, expected);
}
