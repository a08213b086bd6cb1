use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::BillingMonth;
use crate::models::billing::SubscriptionResponse;
use crate::models::lesson::LessonResponse;

/// Lifecycle of a recurring slot.
///
/// `Cancelled` is terminal; `Suspended` may return to `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Active,
    Cancelled,
    Suspended,
}

impl SlotStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SlotStatus::Active => "active",
            SlotStatus::Cancelled => "cancelled",
            SlotStatus::Suspended => "suspended",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "active" => Ok(SlotStatus::Active),
            "cancelled" => Ok(SlotStatus::Cancelled),
            "suspended" => Ok(SlotStatus::Suspended),
            other => Err(format!("Unknown slot status '{other}'")),
        }
    }

    pub fn can_transition_to(self, next: SlotStatus) -> bool {
        match (self, next) {
            (SlotStatus::Active, SlotStatus::Cancelled)
            | (SlotStatus::Active, SlotStatus::Suspended)
            | (SlotStatus::Suspended, SlotStatus::Active)
            | (SlotStatus::Suspended, SlotStatus::Cancelled) => true,
            _ => false,
        }
    }
}

/// A weekly recurring lesson commitment between a teacher and a student.
///
/// At most one `active` slot may exist per
/// `(teacher_id, day_of_week, start_time, duration_minutes)` tuple; the
/// database enforces this with a partial unique index as the backstop against
/// concurrent booking races.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringSlot {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub student_id: Uuid,
    /// 0 = Monday .. 6 = Sunday
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub duration_minutes: u16,
    /// IANA timezone the wall-clock `start_time` is interpreted in
    pub timezone: String,
    pub monthly_rate_cents: Option<i64>,
    pub rate_per_lesson_cents: Option<i64>,
    pub status: SlotStatus,
    pub booked_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    pub teacher_id: Uuid,
    pub student_id: Uuid,
    /// 0 = Monday .. 6 = Sunday
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub duration_minutes: u16,
    pub timezone: String,
    /// Flat monthly rate; mutually exclusive with `rate_per_lesson_cents`
    pub monthly_rate_cents: Option<i64>,
    /// Per-lesson rate; mutually exclusive with `monthly_rate_cents`
    pub rate_per_lesson_cents: Option<i64>,
    pub start_month: BillingMonth,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingResponse {
    pub slot: RecurringSlot,
    pub subscription: SubscriptionResponse,
    pub lessons: Vec<LessonResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelBookingRequest {
    pub effective_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelBookingResponse {
    pub slots_removed: u64,
    pub lessons_cancelled: u64,
}
