//! # Booking Conflict Checker
//!
//! Pure decision logic for whether a candidate recurring slot is bookable for
//! a teacher. The caller fetches the teacher's weekly availability windows,
//! absolute blocked periods, committed weekly slots, and already-scheduled
//! lessons, and this module evaluates the candidate against them without
//! touching the database.
//!
//! ## Check order
//!
//! The checks run in a fixed order and the first failure short-circuits with
//! its reason code:
//!
//! 1. `NOT_AVAILABLE`: the candidate is not fully contained in any active
//!    weekly availability window for its weekday
//! 2. `BLOCKED`: an occurrence intersects an absolute blocked period
//!    (vacation etc.), which overrides weekly availability
//! 3. `CONFLICT`: the candidate overlaps another committed weekly slot, or
//!    an occurrence overlaps an already-scheduled lesson
//! 4. `OUT_OF_WINDOW`: the first occurrence violates the minimum-notice
//!    cutoff or the advance-booking limit
//!
//! Two half-open ranges `[a, b)` and `[c, d)` overlap iff `a < d && c < b`;
//! back-to-back bookings (one ending exactly when the next starts) therefore
//! do not conflict.
//!
//! Wall-clock intervals are compared as seconds since midnight, so an
//! interval ending exactly at midnight is 86400 rather than a wrapped 00:00.

use chrono::{DateTime, Duration, NaiveTime, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::calendar::weekday_from_index;
use crate::errors::LessonError;
use crate::models::availability::{AvailabilityWindow, BlockedTime};

/// Why a candidate booking was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DenialReason {
    NotAvailable,
    Blocked,
    Conflict,
    OutOfWindow,
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            DenialReason::NotAvailable => "NOT_AVAILABLE",
            DenialReason::Blocked => "BLOCKED",
            DenialReason::Conflict => "CONFLICT",
            DenialReason::OutOfWindow => "OUT_OF_WINDOW",
        };
        write!(f, "{code}")
    }
}

/// A denied booking, carrying enough detail for the caller to resolve it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingDenied {
    pub reason: DenialReason,
    pub detail: String,
}

impl From<BookingDenied> for LessonError {
    fn from(denied: BookingDenied) -> Self {
        LessonError::BookingConflict {
            reason: denied.reason,
            detail: denied.detail,
        }
    }
}

/// Teacher policy limits on how far out and how soon a slot may start.
#[derive(Debug, Clone, Copy)]
pub struct BookingPolicy {
    /// Maximum days into the future the first occurrence may lie
    pub max_advance_days: i64,
    /// Minimum hours of notice before the first occurrence
    pub min_notice_hours: i64,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            max_advance_days: 60,
            min_notice_hours: 24,
        }
    }
}

/// The candidate weekly slot under evaluation.
///
/// `occurrences` holds the concrete UTC start datetimes the slot would
/// produce over the initial generation horizon, precomputed by the caller via
/// [`crate::calendar::occurrences_in_range`]. They are what gets compared
/// against absolute blocked periods and scheduled lessons.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub day_of_week: Weekday,
    pub start_time: NaiveTime,
    pub duration_minutes: u16,
    pub occurrences: Vec<DateTime<Utc>>,
}

impl Candidate {
    fn end_secs(&self) -> i64 {
        wall_secs(self.start_time) + i64::from(self.duration_minutes) * 60
    }
}

fn wall_secs(time: NaiveTime) -> i64 {
    i64::from(time.num_seconds_from_midnight())
}

/// An existing committed weekly slot for the same teacher.
#[derive(Debug, Clone)]
pub struct WeeklyCommitment {
    pub day_of_week: Weekday,
    pub start_time: NaiveTime,
    pub duration_minutes: u16,
}

/// An absolute time range, used for already-scheduled lessons.
#[derive(Debug, Clone, Copy)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Half-open overlap test: `[a, b)` and `[c, d)` overlap iff `a < d && c < b`.
pub fn ranges_overlap<T: PartialOrd>(a: T, b: T, c: T, d: T) -> bool {
    a < d && c < b
}

/// Evaluates a candidate slot against the teacher's availability, blocked
/// periods, existing commitments, and booking policy.
///
/// Returns `Ok(())` when bookable, otherwise the first failing check's
/// [`BookingDenied`].
pub fn check_candidate(
    candidate: &Candidate,
    windows: &[AvailabilityWindow],
    blocked: &[BlockedTime],
    committed_slots: &[WeeklyCommitment],
    scheduled_lessons: &[TimeRange],
    policy: &BookingPolicy,
    now: DateTime<Utc>,
) -> Result<(), BookingDenied> {
    let candidate_start = wall_secs(candidate.start_time);
    let candidate_end = candidate.end_secs();
    let duration = Duration::minutes(i64::from(candidate.duration_minutes));

    // (a) Fully inside some active weekly window for this weekday
    let within_window = windows.iter().any(|window| {
        window.is_active
            && weekday_from_index(window.day_of_week) == Some(candidate.day_of_week)
            && wall_secs(window.start_time) <= candidate_start
            && candidate_end <= wall_secs(window.end_time)
    });
    if !within_window {
        return Err(BookingDenied {
            reason: DenialReason::NotAvailable,
            detail: format!(
                "{} {} ({} min) is outside the teacher's availability",
                candidate.day_of_week, candidate.start_time, candidate.duration_minutes
            ),
        });
    }

    // (b) No occurrence intersects a blocked period
    for occurrence in &candidate.occurrences {
        let occurrence_end = *occurrence + duration;
        if let Some(block) = blocked
            .iter()
            .find(|b| ranges_overlap(*occurrence, occurrence_end, b.start_time, b.end_time))
        {
            return Err(BookingDenied {
                reason: DenialReason::Blocked,
                detail: format!(
                    "Occurrence at {} falls in a blocked period {} - {}",
                    occurrence, block.start_time, block.end_time
                ),
            });
        }
    }

    // (c) No overlap with committed weekly slots or scheduled lessons
    if let Some(existing) = committed_slots.iter().find(|slot| {
        slot.day_of_week == candidate.day_of_week
            && ranges_overlap(
                candidate_start,
                candidate_end,
                wall_secs(slot.start_time),
                wall_secs(slot.start_time) + i64::from(slot.duration_minutes) * 60,
            )
    }) {
        return Err(BookingDenied {
            reason: DenialReason::Conflict,
            detail: format!(
                "Overlaps an existing weekly slot {} {} ({} min)",
                existing.day_of_week, existing.start_time, existing.duration_minutes
            ),
        });
    }
    for occurrence in &candidate.occurrences {
        let occurrence_end = *occurrence + duration;
        if let Some(lesson) = scheduled_lessons
            .iter()
            .find(|l| ranges_overlap(*occurrence, occurrence_end, l.start, l.end))
        {
            return Err(BookingDenied {
                reason: DenialReason::Conflict,
                detail: format!(
                    "Occurrence at {} overlaps a scheduled lesson {} - {}",
                    occurrence, lesson.start, lesson.end
                ),
            });
        }
    }

    // (d) Policy window around the first occurrence
    if let Some(first) = candidate.occurrences.first() {
        let earliest = now + Duration::hours(policy.min_notice_hours);
        let latest = now + Duration::days(policy.max_advance_days);
        if *first < earliest {
            return Err(BookingDenied {
                reason: DenialReason::OutOfWindow,
                detail: format!(
                    "First occurrence {} is within the {}-hour notice cutoff",
                    first, policy.min_notice_hours
                ),
            });
        }
        if *first > latest {
            return Err(BookingDenied {
                reason: DenialReason::OutOfWindow,
                detail: format!(
                    "First occurrence {} is more than {} days ahead",
                    first, policy.max_advance_days
                ),
            });
        }
    }

    Ok(())
}
