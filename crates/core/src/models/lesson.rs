use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl LessonStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LessonStatus::Scheduled => "scheduled",
            LessonStatus::Completed => "completed",
            LessonStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "scheduled" => Ok(LessonStatus::Scheduled),
            "completed" => Ok(LessonStatus::Completed),
            "cancelled" => Ok(LessonStatus::Cancelled),
            other => Err(format!("Unknown lesson status '{other}'")),
        }
    }
}

/// One concrete occurrence of a slot's weekly pattern (or a one-off booking).
///
/// `version` is the optimistic-lock counter: it increments on every
/// successful mutation, and a mutation supplying a stale version is rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonResponse {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub student_id: Uuid,
    pub slot_id: Option<Uuid>,
    pub date: DateTime<Utc>,
    pub duration_minutes: u16,
    pub status: LessonStatus,
    pub is_recurring: bool,
    pub notes: Option<String>,
    pub version: i64,
}

/// Fields a lesson mutation may change. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LessonPatch {
    pub notes: Option<String>,
    pub status: Option<LessonStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateLessonRequest {
    pub expected_version: i64,
    pub patch: LessonPatch,
}
