//! # Calendar Arithmetic
//!
//! Pure functions that expand a weekly slot pattern (day of week + wall-clock
//! start time + timezone) into concrete UTC datetimes, and count how often a
//! weekday falls within a calendar month. Billing consumes the per-month count
//! directly, so it is always recomputed for the requested month and never
//! cached across months (a weekday occurs 4 times in some months and 5 in
//! others).
//!
//! Wall-clock times are interpreted in the slot's declared IANA timezone and
//! converted to UTC, so a "Wednesday 18:00 Europe/Berlin" slot stays at 18:00
//! local across daylight-saving transitions instead of drifting.

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A calendar month in `YYYY-MM` form, the unit of billing.
///
/// Construction is validated (`month` is always 1-12), and the textual form
/// sorts the same way the value does, which lets month ranges be compared as
/// plain strings in SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BillingMonth {
    year: i32,
    month: u32,
}

impl BillingMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) && (0..=9999).contains(&year) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// The month containing the given date.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }

    pub fn first_day(self) -> NaiveDate {
        // Fields are validated at construction, so this cannot fail
        NaiveDate::from_ymd_opt(self.year, self.month, 1).expect("validated month")
    }

    pub fn last_day(self) -> NaiveDate {
        self.next().first_day() - Duration::days(1)
    }

    /// Number of days in the month (28-31).
    pub fn days(self) -> u32 {
        (self.next().first_day() - self.first_day()).num_days() as u32
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for BillingMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for BillingMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| format!("Invalid month '{s}', expected YYYY-MM"))?;
        let year: i32 = year
            .parse()
            .map_err(|_| format!("Invalid year in month '{s}'"))?;
        let month: u32 = month
            .parse()
            .map_err(|_| format!("Invalid month number in '{s}'"))?;
        Self::new(year, month).ok_or_else(|| format!("Month '{s}' out of range"))
    }
}

impl TryFrom<String> for BillingMonth {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BillingMonth> for String {
    fn from(value: BillingMonth) -> Self {
        value.to_string()
    }
}

/// Maps the wire/storage day index (0 = Monday .. 6 = Sunday) to a weekday.
pub fn weekday_from_index(index: u8) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Mon),
        1 => Some(Weekday::Tue),
        2 => Some(Weekday::Wed),
        3 => Some(Weekday::Thu),
        4 => Some(Weekday::Fri),
        5 => Some(Weekday::Sat),
        6 => Some(Weekday::Sun),
        _ => None,
    }
}

/// Inverse of [`weekday_from_index`].
pub fn weekday_index(weekday: Weekday) -> u8 {
    weekday.num_days_from_monday() as u8
}

/// Interprets a wall-clock time on a date in the given timezone and converts
/// it to UTC.
///
/// Daylight-saving policy: a time erased by a spring-forward gap is shifted
/// forward by one hour (the usual gap length); an ambiguous fall-back time
/// resolves to the earlier of the two instants.
pub fn localize(date: NaiveDate, time: NaiveTime, timezone: Tz) -> DateTime<Utc> {
    let naive = date.and_time(time);
    match timezone.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earlier, _) => earlier.with_timezone(&Utc),
        LocalResult::None => {
            let shifted = naive + Duration::hours(1);
            match timezone.from_local_datetime(&shifted) {
                LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
                // A gap longer than an hour is not something IANA data
                // produces for civil timezones; fall back to UTC wall time.
                LocalResult::None => Utc.from_utc_datetime(&naive),
            }
        }
    }
}

/// Expands a weekly pattern into concrete UTC start datetimes.
///
/// Returns every date in `[range_start, range_end]` (inclusive) whose weekday
/// matches `day_of_week`, combined with `start_time` interpreted in
/// `timezone`. The result is in chronological order.
pub fn occurrences_in_range(
    day_of_week: Weekday,
    start_time: NaiveTime,
    range_start: NaiveDate,
    range_end: NaiveDate,
    timezone: Tz,
) -> Vec<DateTime<Utc>> {
    let mut occurrences = Vec::new();
    if range_end < range_start {
        return occurrences;
    }

    // Advance to the first date in range matching the requested weekday,
    // then step a week at a time.
    let offset = (day_of_week.num_days_from_monday() + 7
        - range_start.weekday().num_days_from_monday())
        % 7;
    let mut day = range_start + Duration::days(i64::from(offset));
    while day <= range_end {
        occurrences.push(localize(day, start_time, timezone));
        day += Duration::days(7);
    }

    occurrences
}

/// How many times `day_of_week` falls within the given calendar month.
///
/// Always 4 or 5. Billing uses this as the expected lesson count for a slot,
/// so it must reflect the specific month being billed.
pub fn occurrence_count_in_month(day_of_week: Weekday, month: BillingMonth) -> u32 {
    let first = month.first_day();
    let offset = (day_of_week.num_days_from_monday() + 7
        - first.weekday().num_days_from_monday())
        % 7;
    let days = month.days();
    // offset < 7 <= days, so the weekday occurs at least once
    1 + (days - offset - 1) / 7
}
