use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Timelike, Weekday};
use chrono_tz::Tz;
use lessonsync_core::calendar::{
    BillingMonth, localize, occurrence_count_in_month, occurrences_in_range, weekday_from_index,
    weekday_index,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn month(s: &str) -> BillingMonth {
    s.parse().expect("valid month literal")
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date literal")
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).expect("valid time literal")
}

#[test]
fn test_billing_month_parse_and_display() {
    let m = month("2024-02");
    assert_eq!(m.year(), 2024);
    assert_eq!(m.month(), 2);
    assert_eq!(m.to_string(), "2024-02");

    // Single-digit months are zero-padded so text and value sort identically
    assert_eq!(month("2024-5").to_string(), "2024-05");
}

#[rstest]
#[case("2024-13")]
#[case("2024-00")]
#[case("202402")]
#[case("abcd-01")]
#[case("2024-xy")]
fn test_billing_month_rejects_invalid(#[case] input: &str) {
    assert!(input.parse::<BillingMonth>().is_err());
}

#[test]
fn test_billing_month_ordering_matches_string_ordering() {
    let months = ["2023-12", "2024-01", "2024-02", "2024-10"];
    for pair in months.windows(2) {
        assert!(month(pair[0]) < month(pair[1]));
        assert!(pair[0] < pair[1]);
    }
}

#[test]
fn test_billing_month_next_wraps_year() {
    assert_eq!(month("2024-12").next(), month("2025-01"));
    assert_eq!(month("2024-01").next(), month("2024-02"));
}

#[rstest]
#[case("2024-02", 29)]
#[case("2023-02", 28)]
#[case("2024-01", 31)]
#[case("2024-04", 30)]
fn test_billing_month_days(#[case] m: &str, #[case] days: u32) {
    assert_eq!(month(m).days(), days);
}

#[test]
fn test_billing_month_containing_and_contains() {
    let m = BillingMonth::containing(date(2024, 2, 15));
    assert_eq!(m, month("2024-02"));
    assert!(m.contains(date(2024, 2, 1)));
    assert!(m.contains(date(2024, 2, 29)));
    assert!(!m.contains(date(2024, 3, 1)));
}

#[rstest]
#[case(0, Weekday::Mon)]
#[case(1, Weekday::Tue)]
#[case(2, Weekday::Wed)]
#[case(3, Weekday::Thu)]
#[case(4, Weekday::Fri)]
#[case(5, Weekday::Sat)]
#[case(6, Weekday::Sun)]
fn test_weekday_index_mapping(#[case] index: u8, #[case] weekday: Weekday) {
    assert_eq!(weekday_from_index(index), Some(weekday));
    assert_eq!(weekday_index(weekday), index);
}

#[test]
fn test_weekday_from_index_rejects_out_of_range() {
    assert_eq!(weekday_from_index(7), None);
    assert_eq!(weekday_from_index(255), None);
}

#[rstest]
// February 2024 starts on a Thursday and has 29 days
#[case(Weekday::Wed, "2024-02", 4)]
#[case(Weekday::Thu, "2024-02", 5)]
// January 2024 starts on a Monday and has 31 days
#[case(Weekday::Mon, "2024-01", 5)]
#[case(Weekday::Thu, "2024-01", 4)]
// Non-leap February with exactly 4 of every weekday
#[case(Weekday::Mon, "2023-02", 4)]
#[case(Weekday::Sun, "2023-02", 4)]
fn test_occurrence_count_in_month(
    #[case] weekday: Weekday,
    #[case] m: &str,
    #[case] expected: u32,
) {
    assert_eq!(occurrence_count_in_month(weekday, month(m)), expected);
}

#[test]
fn test_occurrence_count_matches_day_scan() {
    // Cross-check the arithmetic against walking every day of the month
    for m in ["2023-02", "2024-02", "2024-03", "2024-12", "2025-06"] {
        let m = month(m);
        for index in 0..7u8 {
            let weekday = weekday_from_index(index).expect("index in range");
            let mut scanned = 0;
            let mut day = m.first_day();
            while day <= m.last_day() {
                if day.weekday() == weekday {
                    scanned += 1;
                }
                day += Duration::days(1);
            }
            assert_eq!(
                occurrence_count_in_month(weekday, m),
                scanned,
                "{weekday} in {m}"
            );
        }
    }
}

#[test]
fn test_localize_standard_and_summer_time() {
    let berlin: Tz = "Europe/Berlin".parse().expect("known zone");

    // CET is UTC+1
    let winter = localize(date(2024, 1, 10), time(18, 0), berlin);
    assert_eq!(winter.to_rfc3339(), "2024-01-10T17:00:00+00:00");

    // CEST is UTC+2
    let summer = localize(date(2024, 7, 10), time(18, 0), berlin);
    assert_eq!(summer.to_rfc3339(), "2024-07-10T16:00:00+00:00");
}

#[test]
fn test_localize_spring_forward_gap_shifts_one_hour() {
    // 02:30 on 2024-03-10 does not exist in America/New_York; the clock
    // jumps from 02:00 EST to 03:00 EDT
    let new_york: Tz = "America/New_York".parse().expect("known zone");
    let resolved = localize(date(2024, 3, 10), time(2, 30), new_york);
    // Shifted to 03:30 EDT (UTC-4)
    assert_eq!(resolved.to_rfc3339(), "2024-03-10T07:30:00+00:00");
}

#[test]
fn test_localize_fall_back_takes_earlier_instant() {
    // 01:30 on 2024-11-03 happens twice in America/New_York; the earlier
    // instant is still EDT (UTC-4)
    let new_york: Tz = "America/New_York".parse().expect("known zone");
    let resolved = localize(date(2024, 11, 3), time(1, 30), new_york);
    assert_eq!(resolved.to_rfc3339(), "2024-11-03T05:30:00+00:00");
}

#[test]
fn test_occurrences_weekly_spacing_and_inclusive_bounds() {
    let utc: Tz = "UTC".parse().expect("known zone");
    // 2024-04-01 is a Monday, 2024-04-29 is the fifth Monday of April
    let occurrences = occurrences_in_range(
        Weekday::Mon,
        time(9, 0),
        date(2024, 4, 1),
        date(2024, 4, 29),
        utc,
    );

    assert_eq!(occurrences.len(), 5);
    assert_eq!(occurrences[0].to_rfc3339(), "2024-04-01T09:00:00+00:00");
    assert_eq!(occurrences[4].to_rfc3339(), "2024-04-29T09:00:00+00:00");
    for pair in occurrences.windows(2) {
        assert_eq!(pair[1] - pair[0], Duration::weeks(1));
    }
}

#[test]
fn test_occurrences_empty_when_range_reversed_or_misses_weekday() {
    let utc: Tz = "UTC".parse().expect("known zone");
    assert!(
        occurrences_in_range(Weekday::Mon, time(9, 0), date(2024, 4, 10), date(2024, 4, 1), utc)
            .is_empty()
    );
    // Tue 2024-04-02 through Thu 2024-04-04 contains no Monday
    assert!(
        occurrences_in_range(Weekday::Mon, time(9, 0), date(2024, 4, 2), date(2024, 4, 4), utc)
            .is_empty()
    );
}

#[test]
fn test_occurrences_hold_local_time_across_dst() {
    let berlin: Tz = "Europe/Berlin".parse().expect("known zone");
    // Wednesdays spanning the 2024-03-31 CET -> CEST transition
    let occurrences = occurrences_in_range(
        Weekday::Wed,
        time(18, 0),
        date(2024, 3, 20),
        date(2024, 4, 3),
        berlin,
    );

    assert_eq!(occurrences.len(), 3);
    // UTC instants shift with the offset change
    assert_eq!(occurrences[0].to_rfc3339(), "2024-03-20T17:00:00+00:00");
    assert_eq!(occurrences[1].to_rfc3339(), "2024-03-27T17:00:00+00:00");
    assert_eq!(occurrences[2].to_rfc3339(), "2024-04-03T16:00:00+00:00");
    // Local wall-clock time does not
    for occurrence in &occurrences {
        assert_eq!(occurrence.with_timezone(&berlin).hour(), 18);
    }
}

#[test]
fn test_billing_month_serde_uses_string_form() {
    let m = month("2024-05");
    assert_eq!(serde_json::to_string(&m).expect("serialize"), "\"2024-05\"");

    let parsed: BillingMonth = serde_json::from_str("\"2024-05\"").expect("deserialize");
    assert_eq!(parsed, m);

    assert!(serde_json::from_str::<BillingMonth>("\"2024-13\"").is_err());
}
