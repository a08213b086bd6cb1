use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc, Weekday};
use lessonsync_core::conflict::{
    BookingPolicy, Candidate, DenialReason, TimeRange, WeeklyCommitment, check_candidate,
    ranges_overlap,
};
use lessonsync_core::models::availability::{AvailabilityWindow, BlockedTime};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).expect("valid time literal")
}

fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).single().expect("valid datetime literal")
}

fn window(day_of_week: u8, start: NaiveTime, end: NaiveTime) -> AvailabilityWindow {
    AvailabilityWindow {
        day_of_week,
        start_time: start,
        end_time: end,
        is_active: true,
    }
}

/// Wednesday 10:00-11:00 with occurrences on the first two Wednesdays of
/// April 2024, evaluated against a "now" of 2024-03-27.
fn wednesday_candidate() -> Candidate {
    Candidate {
        day_of_week: Weekday::Wed,
        start_time: time(10, 0),
        duration_minutes: 60,
        occurrences: vec![utc(2024, 4, 3, 10, 0), utc(2024, 4, 10, 10, 0)],
    }
}

fn now() -> DateTime<Utc> {
    utc(2024, 3, 27, 12, 0)
}

#[rstest]
#[case(0, 10, 5, 15, true)] // plain overlap
#[case(0, 10, 10, 20, false)] // back-to-back, half-open
#[case(10, 20, 0, 10, false)] // back-to-back the other way
#[case(0, 10, 20, 30, false)] // disjoint
#[case(0, 30, 10, 20, true)] // containment
fn test_ranges_overlap(
    #[case] a: i32,
    #[case] b: i32,
    #[case] c: i32,
    #[case] d: i32,
    #[case] expected: bool,
) {
    assert_eq!(ranges_overlap(a, b, c, d), expected);
}

#[test]
fn test_bookable_inside_active_window() {
    let result = check_candidate(
        &wednesday_candidate(),
        &[window(2, time(9, 0), time(17, 0))],
        &[],
        &[],
        &[],
        &BookingPolicy::default(),
        now(),
    );
    assert_eq!(result, Ok(()));
}

#[test]
fn test_denied_when_no_window_for_weekday() {
    // Thursday window only
    let result = check_candidate(
        &wednesday_candidate(),
        &[window(3, time(9, 0), time(17, 0))],
        &[],
        &[],
        &[],
        &BookingPolicy::default(),
        now(),
    );
    assert_eq!(result.unwrap_err().reason, DenialReason::NotAvailable);
}

#[test]
fn test_denied_when_window_is_inactive() {
    let mut w = window(2, time(9, 0), time(17, 0));
    w.is_active = false;

    let result =
        check_candidate(&wednesday_candidate(), &[w], &[], &[], &[], &BookingPolicy::default(), now());
    assert_eq!(result.unwrap_err().reason, DenialReason::NotAvailable);
}

#[test]
fn test_denied_when_candidate_spills_past_window_end() {
    // Window ends at 10:30, candidate runs 10:00-11:00
    let result = check_candidate(
        &wednesday_candidate(),
        &[window(2, time(9, 0), time(10, 30))],
        &[],
        &[],
        &[],
        &BookingPolicy::default(),
        now(),
    );
    assert_eq!(result.unwrap_err().reason, DenialReason::NotAvailable);
}

#[test]
fn test_candidate_ending_exactly_at_window_end_is_bookable() {
    let result = check_candidate(
        &wednesday_candidate(),
        &[window(2, time(10, 0), time(11, 0))],
        &[],
        &[],
        &[],
        &BookingPolicy::default(),
        now(),
    );
    assert_eq!(result, Ok(()));
}

#[test]
fn test_denied_when_occurrence_falls_in_blocked_period() {
    let blocked = BlockedTime {
        start_time: utc(2024, 4, 8, 0, 0),
        end_time: utc(2024, 4, 12, 0, 0),
        reason: Some("vacation".to_string()),
    };

    let result = check_candidate(
        &wednesday_candidate(),
        &[window(2, time(9, 0), time(17, 0))],
        &[blocked],
        &[],
        &[],
        &BookingPolicy::default(),
        now(),
    );
    assert_eq!(result.unwrap_err().reason, DenialReason::Blocked);
}

#[test]
fn test_blocked_period_outside_occurrences_is_ignored() {
    let blocked = BlockedTime {
        start_time: utc(2024, 5, 1, 0, 0),
        end_time: utc(2024, 5, 8, 0, 0),
        reason: None,
    };

    let result = check_candidate(
        &wednesday_candidate(),
        &[window(2, time(9, 0), time(17, 0))],
        &[blocked],
        &[],
        &[],
        &BookingPolicy::default(),
        now(),
    );
    assert_eq!(result, Ok(()));
}

#[test]
fn test_denied_when_overlapping_committed_weekly_slot() {
    let existing = WeeklyCommitment {
        day_of_week: Weekday::Wed,
        start_time: time(10, 30),
        duration_minutes: 60,
    };

    let result = check_candidate(
        &wednesday_candidate(),
        &[window(2, time(9, 0), time(17, 0))],
        &[],
        &[existing],
        &[],
        &BookingPolicy::default(),
        now(),
    );
    assert_eq!(result.unwrap_err().reason, DenialReason::Conflict);
}

#[test]
fn test_back_to_back_weekly_slots_do_not_conflict() {
    // Existing slot ends at exactly 10:00, candidate starts at 10:00
    let existing = WeeklyCommitment {
        day_of_week: Weekday::Wed,
        start_time: time(9, 0),
        duration_minutes: 60,
    };

    let result = check_candidate(
        &wednesday_candidate(),
        &[window(2, time(9, 0), time(17, 0))],
        &[],
        &[existing],
        &[],
        &BookingPolicy::default(),
        now(),
    );
    assert_eq!(result, Ok(()));
}

#[test]
fn test_same_time_on_other_weekday_does_not_conflict() {
    let existing = WeeklyCommitment {
        day_of_week: Weekday::Thu,
        start_time: time(10, 0),
        duration_minutes: 60,
    };

    let result = check_candidate(
        &wednesday_candidate(),
        &[window(2, time(9, 0), time(17, 0))],
        &[],
        &[existing],
        &[],
        &BookingPolicy::default(),
        now(),
    );
    assert_eq!(result, Ok(()));
}

#[test]
fn test_denied_when_occurrence_overlaps_scheduled_lesson() {
    // One-off lesson sitting on the second occurrence
    let lesson = TimeRange {
        start: utc(2024, 4, 10, 10, 30),
        end: utc(2024, 4, 10, 11, 30),
    };

    let result = check_candidate(
        &wednesday_candidate(),
        &[window(2, time(9, 0), time(17, 0))],
        &[],
        &[],
        &[lesson],
        &BookingPolicy::default(),
        now(),
    );
    assert_eq!(result.unwrap_err().reason, DenialReason::Conflict);
}

#[test]
fn test_denied_when_first_occurrence_violates_min_notice() {
    // First occurrence only 22 hours away from "now"
    let candidate = Candidate {
        occurrences: vec![utc(2024, 3, 28, 10, 0)],
        ..wednesday_candidate()
    };

    let result = check_candidate(
        &candidate,
        &[window(2, time(9, 0), time(17, 0))],
        &[],
        &[],
        &[],
        &BookingPolicy::default(),
        now(),
    );
    assert_eq!(result.unwrap_err().reason, DenialReason::OutOfWindow);
}

#[test]
fn test_denied_when_first_occurrence_beyond_advance_limit() {
    let candidate = Candidate {
        occurrences: vec![now() + Duration::days(61)],
        ..wednesday_candidate()
    };

    let result = check_candidate(
        &candidate,
        &[window(2, time(9, 0), time(17, 0))],
        &[],
        &[],
        &[],
        &BookingPolicy::default(),
        now(),
    );
    assert_eq!(result.unwrap_err().reason, DenialReason::OutOfWindow);
}

#[test]
fn test_midnight_ending_candidate_is_not_contained_by_daytime_window() {
    // 23:00 + 60 min ends exactly at midnight; the wall-clock end must not
    // wrap to 00:00 and slip through the containment check
    let candidate = Candidate {
        start_time: time(23, 0),
        duration_minutes: 60,
        ..wednesday_candidate()
    };

    let result = check_candidate(
        &candidate,
        &[window(2, time(9, 0), time(17, 0))],
        &[],
        &[],
        &[],
        &BookingPolicy::default(),
        now(),
    );
    assert_eq!(result.unwrap_err().reason, DenialReason::NotAvailable);
}

#[test]
fn test_committed_slot_ending_at_midnight_still_conflicts() {
    // Existing slot runs 23:00-24:00; a 22:30-23:30 candidate overlaps it
    // even though the slot's wall-clock end wraps past the day boundary
    let candidate = Candidate {
        start_time: time(22, 30),
        duration_minutes: 60,
        ..wednesday_candidate()
    };
    let existing = WeeklyCommitment {
        day_of_week: Weekday::Wed,
        start_time: time(23, 0),
        duration_minutes: 60,
    };

    let result = check_candidate(
        &candidate,
        &[window(2, time(9, 0), time(23, 30))],
        &[],
        &[existing],
        &[],
        &BookingPolicy::default(),
        now(),
    );
    assert_eq!(result.unwrap_err().reason, DenialReason::Conflict);
}

#[test]
fn test_candidate_ending_when_midnight_slot_starts_is_bookable() {
    let candidate = Candidate {
        start_time: time(22, 0),
        duration_minutes: 60,
        ..wednesday_candidate()
    };
    let existing = WeeklyCommitment {
        day_of_week: Weekday::Wed,
        start_time: time(23, 0),
        duration_minutes: 60,
    };

    let result = check_candidate(
        &candidate,
        &[window(2, time(9, 0), time(23, 0))],
        &[],
        &[existing],
        &[],
        &BookingPolicy::default(),
        now(),
    );
    assert_eq!(result, Ok(()));
}

#[test]
fn test_availability_failure_wins_over_later_checks() {
    // No window, plus a blocked period and a conflicting slot: the reason
    // reported is the first check that failed
    let blocked = BlockedTime {
        start_time: utc(2024, 4, 3, 0, 0),
        end_time: utc(2024, 4, 4, 0, 0),
        reason: None,
    };
    let existing = WeeklyCommitment {
        day_of_week: Weekday::Wed,
        start_time: time(10, 0),
        duration_minutes: 60,
    };

    let result = check_candidate(
        &wednesday_candidate(),
        &[],
        &[blocked],
        &[existing],
        &[],
        &BookingPolicy::default(),
        now(),
    );
    assert_eq!(result.unwrap_err().reason, DenialReason::NotAvailable);
}

#[test]
fn test_blocked_wins_over_conflict() {
    let blocked = BlockedTime {
        start_time: utc(2024, 4, 3, 0, 0),
        end_time: utc(2024, 4, 4, 0, 0),
        reason: None,
    };
    let existing = WeeklyCommitment {
        day_of_week: Weekday::Wed,
        start_time: time(10, 0),
        duration_minutes: 60,
    };

    let result = check_candidate(
        &wednesday_candidate(),
        &[window(2, time(9, 0), time(17, 0))],
        &[blocked],
        &[existing],
        &[],
        &BookingPolicy::default(),
        now(),
    );
    assert_eq!(result.unwrap_err().reason, DenialReason::Blocked);
}
