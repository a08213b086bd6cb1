use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// A declarative weekly availability window for a teacher.
///
/// A candidate slot must be fully contained in some active window for its
/// weekday to be bookable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    /// 0 = Monday .. 6 = Sunday
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_active: bool,
}

/// An absolute-time exclusion (vacation etc.) overriding weekly availability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockedTime {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAvailabilityRequest {
    /// Replaces the teacher's full weekly window set
    pub windows: Vec<AvailabilityWindow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAvailabilityResponse {
    pub windows_saved: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBlockedTimeRequest {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub reason: Option<String>,
}
