use chrono::{DateTime, NaiveTime, Utc};
use eyre::{Result, eyre};
use lessonsync_core::calendar::BillingMonth;
use lessonsync_core::models::availability::{AvailabilityWindow, BlockedTime};
use lessonsync_core::models::billing::{BillingResponse, BillingStatus, SubscriptionResponse, SubscriptionStatus};
use lessonsync_core::models::lesson::{LessonResponse, LessonStatus};
use lessonsync_core::models::slot::{RecurringSlot, SlotStatus};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbRecurringSlot {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub student_id: Uuid,
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub duration_minutes: i16,
    pub timezone: String,
    pub monthly_rate_cents: Option<i64>,
    pub rate_per_lesson_cents: Option<i64>,
    pub status: String,
    pub booked_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl DbRecurringSlot {
    pub fn status(&self) -> Result<SlotStatus> {
        SlotStatus::parse(&self.status).map_err(|e| eyre!(e))
    }

    pub fn into_model(self) -> Result<RecurringSlot> {
        let status = self.status()?;
        Ok(RecurringSlot {
            id: self.id,
            teacher_id: self.teacher_id,
            student_id: self.student_id,
            day_of_week: self.day_of_week as u8,
            start_time: self.start_time,
            duration_minutes: self.duration_minutes as u16,
            timezone: self.timezone,
            monthly_rate_cents: self.monthly_rate_cents,
            rate_per_lesson_cents: self.rate_per_lesson_cents,
            status,
            booked_at: self.booked_at,
            cancelled_at: self.cancelled_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbSlotSubscription {
    pub id: Uuid,
    pub slot_id: Uuid,
    pub student_id: Uuid,
    pub start_month: String,
    pub end_month: Option<String>,
    pub monthly_rate_cents: Option<i64>,
    pub rate_per_lesson_cents: Option<i64>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl DbSlotSubscription {
    pub fn into_model(self) -> Result<SubscriptionResponse> {
        let status = SubscriptionStatus::parse(&self.status).map_err(|e| eyre!(e))?;
        let start_month: BillingMonth = self.start_month.parse().map_err(|e: String| eyre!(e))?;
        let end_month = self
            .end_month
            .map(|m| m.parse::<BillingMonth>().map_err(|e| eyre!(e)))
            .transpose()?;
        Ok(SubscriptionResponse {
            id: self.id,
            slot_id: self.slot_id,
            student_id: self.student_id,
            start_month,
            end_month,
            monthly_rate_cents: self.monthly_rate_cents,
            rate_per_lesson_cents: self.rate_per_lesson_cents,
            status,
        })
    }
}

/// An active subscription joined with its slot, as consumed by the monthly
/// billing job.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbBillableSubscription {
    pub id: Uuid,
    pub slot_id: Uuid,
    pub student_id: Uuid,
    pub teacher_id: Uuid,
    pub day_of_week: i16,
    pub monthly_rate_cents: Option<i64>,
    pub rate_per_lesson_cents: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbLesson {
    pub id: Uuid,
    pub slot_id: Option<Uuid>,
    pub teacher_id: Uuid,
    pub student_id: Uuid,
    pub date: DateTime<Utc>,
    pub duration_minutes: i16,
    pub status: String,
    pub is_recurring: bool,
    pub notes: Option<String>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

impl DbLesson {
    pub fn status(&self) -> Result<LessonStatus> {
        LessonStatus::parse(&self.status).map_err(|e| eyre!(e))
    }

    pub fn into_model(self) -> Result<LessonResponse> {
        let status = self.status()?;
        Ok(LessonResponse {
            id: self.id,
            teacher_id: self.teacher_id,
            student_id: self.student_id,
            slot_id: self.slot_id,
            date: self.date,
            duration_minutes: self.duration_minutes as u16,
            status,
            is_recurring: self.is_recurring,
            notes: self.notes,
            version: self.version,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbMonthlyBilling {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub student_id: Uuid,
    pub teacher_id: Uuid,
    pub month: String,
    pub expected_lessons: i32,
    pub actual_lessons: i32,
    pub rate_per_lesson_cents: Option<i64>,
    pub total_amount_cents: i64,
    pub status: String,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl DbMonthlyBilling {
    pub fn into_model(self) -> Result<BillingResponse> {
        let status = BillingStatus::parse(&self.status).map_err(|e| eyre!(e))?;
        let month: BillingMonth = self.month.parse().map_err(|e: String| eyre!(e))?;
        Ok(BillingResponse {
            id: self.id,
            subscription_id: self.subscription_id,
            student_id: self.student_id,
            teacher_id: self.teacher_id,
            month,
            expected_lessons: self.expected_lessons as u32,
            actual_lessons: self.actual_lessons as u32,
            rate_per_lesson_cents: self.rate_per_lesson_cents,
            total_amount_cents: self.total_amount_cents,
            status,
            paid_at: self.paid_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbAvailabilityWindow {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_active: bool,
}

impl DbAvailabilityWindow {
    pub fn into_model(self) -> AvailabilityWindow {
        AvailabilityWindow {
            day_of_week: self.day_of_week as u8,
            start_time: self.start_time,
            end_time: self.end_time,
            is_active: self.is_active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbBlockedTime {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl DbBlockedTime {
    pub fn into_model(self) -> BlockedTime {
        BlockedTime {
            start_time: self.start_time,
            end_time: self.end_time,
            reason: self.reason,
        }
    }
}
