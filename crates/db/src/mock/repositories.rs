use chrono::{DateTime, NaiveTime, Utc};
use lessonsync_core::errors::LessonResult;
use lessonsync_core::models::lesson::LessonPatch;
use mockall::mock;
use uuid::Uuid;

use crate::models::{DbBillableSubscription, DbLesson, DbMonthlyBilling, DbRecurringSlot};

// Mock repositories for testing
mock! {
    pub SlotRepo {
        pub async fn create_slot(
            &self,
            teacher_id: Uuid,
            student_id: Uuid,
            day_of_week: i16,
            start_time: NaiveTime,
            duration_minutes: i16,
        ) -> eyre::Result<Option<DbRecurringSlot>>;

        pub async fn get_slot_by_id(
            &self,
            id: Uuid,
        ) -> eyre::Result<Option<DbRecurringSlot>>;

        pub async fn get_active_slots_for_teacher(
            &self,
            teacher_id: Uuid,
        ) -> eyre::Result<Vec<DbRecurringSlot>>;

        pub async fn list_teachers_with_active_slots(
            &self,
        ) -> eyre::Result<Vec<Uuid>>;
    }
}

mock! {
    pub LessonRepo {
        pub async fn insert_lesson_if_absent(
            &self,
            slot_id: Uuid,
            teacher_id: Uuid,
            student_id: Uuid,
            date: DateTime<Utc>,
            duration_minutes: i16,
        ) -> eyre::Result<Option<DbLesson>>;

        pub async fn get_lesson_by_id(
            &self,
            id: Uuid,
        ) -> eyre::Result<Option<DbLesson>>;

        pub async fn update_lesson_with_version(
            &self,
            id: Uuid,
            expected_version: i64,
            patch: LessonPatch,
        ) -> LessonResult<DbLesson>;

        pub async fn cancel_scheduled_lessons_from(
            &self,
            slot_id: Uuid,
            effective_date: DateTime<Utc>,
        ) -> eyre::Result<u64>;
    }
}

mock! {
    pub BillingRepo {
        pub async fn list_billable_subscriptions(
            &self,
            month: &'static str,
        ) -> eyre::Result<Vec<DbBillableSubscription>>;

        pub async fn insert_billing_if_absent(
            &self,
            subscription_id: Uuid,
            month: &'static str,
            expected_lessons: i32,
            total_amount_cents: i64,
        ) -> eyre::Result<Option<DbMonthlyBilling>>;
    }
}
