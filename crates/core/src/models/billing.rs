use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::BillingMonth;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Closed,
}

impl SubscriptionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Closed => "closed",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "active" => Ok(SubscriptionStatus::Active),
            "closed" => Ok(SubscriptionStatus::Closed),
            other => Err(format!("Unknown subscription status '{other}'")),
        }
    }
}

/// The billing period attached to a slot.
///
/// A slot gets a fresh subscription when its rate changes, so at most one is
/// `active` per slot and `start_month <= end_month` whenever `end_month` is
/// set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionResponse {
    pub id: Uuid,
    pub slot_id: Uuid,
    pub student_id: Uuid,
    pub start_month: BillingMonth,
    pub end_month: Option<BillingMonth>,
    pub monthly_rate_cents: Option<i64>,
    pub rate_per_lesson_cents: Option<i64>,
    pub status: SubscriptionStatus,
}

/// Billing lifecycle: `pending -> billed -> paid | overdue`; anything not yet
/// paid may be cancelled when the subscription is cancelled retroactively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingStatus {
    Pending,
    Billed,
    Paid,
    Overdue,
    Cancelled,
}

impl BillingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BillingStatus::Pending => "pending",
            BillingStatus::Billed => "billed",
            BillingStatus::Paid => "paid",
            BillingStatus::Overdue => "overdue",
            BillingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "pending" => Ok(BillingStatus::Pending),
            "billed" => Ok(BillingStatus::Billed),
            "paid" => Ok(BillingStatus::Paid),
            "overdue" => Ok(BillingStatus::Overdue),
            "cancelled" => Ok(BillingStatus::Cancelled),
            other => Err(format!("Unknown billing status '{other}'")),
        }
    }

    pub fn can_transition_to(self, next: BillingStatus) -> bool {
        match (self, next) {
            (BillingStatus::Pending, BillingStatus::Billed)
            | (BillingStatus::Billed, BillingStatus::Paid)
            | (BillingStatus::Billed, BillingStatus::Overdue)
            | (BillingStatus::Overdue, BillingStatus::Paid) => true,
            // Any non-paid state may be cancelled
            (current, BillingStatus::Cancelled) => current != BillingStatus::Paid,
            _ => false,
        }
    }
}

/// How a subscription is charged, derived from which rate field is populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatePlan {
    /// Fixed amount per month regardless of how many occurrences it has
    FlatMonthly(i64),
    /// Amount per expected lesson, multiplied by the month's occurrence count
    PerLesson(i64),
}

impl RatePlan {
    /// Exactly one of the two rate fields must be set.
    pub fn from_fields(
        monthly_rate_cents: Option<i64>,
        rate_per_lesson_cents: Option<i64>,
    ) -> Result<Self, String> {
        match (monthly_rate_cents, rate_per_lesson_cents) {
            (Some(rate), None) => Ok(RatePlan::FlatMonthly(rate)),
            (None, Some(rate)) => Ok(RatePlan::PerLesson(rate)),
            (Some(_), Some(_)) => {
                Err("monthly_rate_cents and rate_per_lesson_cents are mutually exclusive".into())
            }
            (None, None) => {
                Err("One of monthly_rate_cents or rate_per_lesson_cents is required".into())
            }
        }
    }

    /// The amount billed for a month with `expected_lessons` occurrences.
    pub fn total_for(self, expected_lessons: u32) -> i64 {
        match self {
            RatePlan::FlatMonthly(rate) => rate,
            RatePlan::PerLesson(rate) => rate * i64::from(expected_lessons),
        }
    }

    /// The per-lesson rate when the plan has one.
    pub fn rate_per_lesson(self) -> Option<i64> {
        match self {
            RatePlan::FlatMonthly(_) => None,
            RatePlan::PerLesson(rate) => Some(rate),
        }
    }
}

/// One billing record per `(subscription, month)`.
///
/// `actual_lessons` tracks completions during the month; the billed amount is
/// fixed at creation. The student pays for the reserved slot, not for lessons
/// attended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingResponse {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub student_id: Uuid,
    pub teacher_id: Uuid,
    pub month: BillingMonth,
    pub expected_lessons: u32,
    pub actual_lessons: u32,
    pub rate_per_lesson_cents: Option<i64>,
    pub total_amount_cents: i64,
    pub status: BillingStatus,
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateLessonsRequest {
    /// Defaults to today
    pub range_start: Option<NaiveDate>,
    /// Defaults to `range_start` + the configured horizon
    pub range_end: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateLessonsResponse {
    pub lessons_generated: u64,
    pub teachers_processed: u64,
    pub errors: Vec<String>,
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateBillingRequest {
    pub month: BillingMonth,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateBillingResponse {
    pub billing_records_created: u64,
    pub errors: Vec<String>,
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkOverdueRequest {
    /// Billed months strictly before this month flip to overdue
    pub as_of: BillingMonth,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkOverdueResponse {
    pub marked_overdue: u64,
}
