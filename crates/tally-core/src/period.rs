//! Calendar period keys for day, week and month buckets.
//!
//! All keys are derived from the *local* calendar date of an instant. A
//! `DateTime<FixedOffset>` carries the offset it was observed in, so
//! `date_naive()` yields the wall-clock date and never shifts a late-evening
//! session into the next UTC day.
//!
//! Weeks start on **Saturday**. A week key is the `YYYY-MM-DD` of that
//! Saturday.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a stored period key cannot be parsed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid {kind} key: {value:?}")]
pub struct PeriodKeyError {
    kind: &'static str,
    value: String,
}

impl PeriodKeyError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Bucket granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Week,
    Month,
}

impl Granularity {
    pub const ALL: [Self; 3] = [Self::Day, Self::Week, Self::Month];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Implements string serde for a key type via its `Display`/`FromStr` pair.
macro_rules! string_serde {
    ($name:ident) => {
        impl TryFrom<String> for $name {
            type Error = PeriodKeyError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(key: $name) -> Self {
                key.to_string()
            }
        }
    };
}

/// A calendar day, formatted `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DayKey(NaiveDate);

impl DayKey {
    #[must_use]
    pub const fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    #[must_use]
    pub const fn date(self) -> NaiveDate {
        self.0
    }

    #[must_use]
    pub fn previous(self) -> Self {
        self.days_before(1)
    }

    /// Saturates at the earliest representable date.
    #[must_use]
    pub fn days_before(self, days: u32) -> Self {
        Self(
            self.0
                .checked_sub_days(Days::new(u64::from(days)))
                .unwrap_or(NaiveDate::MIN),
        )
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for DayKey {
    type Err = PeriodKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Self)
            .map_err(|_| PeriodKeyError::new("day", s))
    }
}

string_serde!(DayKey);

/// A Saturday-anchored week, keyed by the Saturday that starts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WeekKey(NaiveDate);

impl WeekKey {
    /// Returns the week containing `date`.
    #[must_use]
    pub fn containing(date: NaiveDate) -> Self {
        // Sunday = 0 .. Saturday = 6, so Saturday walks back zero days.
        let offset = (date.weekday().num_days_from_sunday() + 1) % 7;
        Self(
            date.checked_sub_days(Days::new(u64::from(offset)))
                .unwrap_or(NaiveDate::MIN),
        )
    }

    /// The Saturday that starts this week.
    #[must_use]
    pub const fn start(self) -> NaiveDate {
        self.0
    }

    #[must_use]
    pub fn contains(self, date: NaiveDate) -> bool {
        date >= self.0 && date < self.0 + Days::new(7)
    }

    #[must_use]
    pub fn previous(self) -> Self {
        self.weeks_before(1)
    }

    /// Saturates at the earliest representable date.
    #[must_use]
    pub fn weeks_before(self, weeks: u32) -> Self {
        Self(
            self.0
                .checked_sub_days(Days::new(u64::from(weeks) * 7))
                .unwrap_or(NaiveDate::MIN),
        )
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for WeekKey {
    type Err = PeriodKeyError;

    /// Parses a week key. Dates that are not Saturdays resolve to the week
    /// containing them.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| PeriodKeyError::new("week", s))?;
        let week = Self::containing(date);
        if week.0 != date {
            tracing::warn!(key = s, week = %week, "week key is not a Saturday");
        }
        Ok(week)
    }
}

string_serde!(WeekKey);

/// A calendar month, formatted `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    #[must_use]
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }

    /// Months since year zero; consecutive months differ by one.
    #[must_use]
    pub fn index(self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month) - 1
    }

    #[must_use]
    pub fn previous(self) -> Self {
        self.months_before(1)
    }

    #[must_use]
    pub fn months_before(self, months: u32) -> Self {
        let index = self.index() - i64::from(months);
        Self {
            year: i32::try_from(index.div_euclid(12)).unwrap_or(i32::MIN),
            month: u32::try_from(index.rem_euclid(12) + 1).unwrap_or(1),
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = PeriodKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PeriodKeyError::new("month", s);
        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        Ok(Self { year, month })
    }
}

string_serde!(MonthKey);

/// The day, week and month keys of one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodKeys {
    pub day: DayKey,
    pub week: WeekKey,
    pub month: MonthKey,
}

impl PeriodKeys {
    #[must_use]
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            day: DayKey::new(date),
            week: WeekKey::containing(date),
            month: MonthKey::containing(date),
        }
    }

    /// Derives all three keys from a single snapshot of `now`.
    #[must_use]
    pub fn at<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        Self::for_date(now.date_naive())
    }

    /// Keys of the period immediately before each of these.
    #[must_use]
    pub fn previous(&self) -> Self {
        Self {
            day: self.day.previous(),
            week: self.week.previous(),
            month: self.month.previous(),
        }
    }

    #[must_use]
    pub fn key(&self, granularity: Granularity) -> String {
        match granularity {
            Granularity::Day => self.day.to_string(),
            Granularity::Week => self.week.to_string(),
            Granularity::Month => self.month.to_string(),
        }
    }
}

/// `YYYY-MM-DD` of `date`.
pub fn day_key(date: NaiveDate) -> String {
    DayKey::new(date).to_string()
}

/// `YYYY-MM-DD` of the Saturday starting the week containing `date`.
pub fn week_key(date: NaiveDate) -> String {
    WeekKey::containing(date).to_string()
}

/// `YYYY-MM` of `date`.
pub fn month_key(date: NaiveDate) -> String {
    MonthKey::containing(date).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Duration;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_week_key_of_saturday_is_itself() {
        assert_eq!(week_key(date("2026-10-17")), "2026-10-17");
        assert_eq!(week_key(date("2026-10-10")), "2026-10-10");
    }

    #[test]
    fn test_week_key_walks_back_to_saturday() {
        // Sunday through Friday after 2026-10-10.
        for day in 11..=16 {
            let d = date(&format!("2026-10-{day}"));
            assert_eq!(week_key(d), "2026-10-10", "wrong week for {d}");
        }
    }

    #[test]
    fn test_seven_consecutive_days_share_one_week_key() {
        let start = date("2026-10-10");
        let keys: std::collections::HashSet<_> = (0..7)
            .map(|offset| week_key(start + Days::new(offset)))
            .collect();
        assert_eq!(keys.len(), 1);
        assert_eq!(week_key(start + Days::new(7)), "2026-10-17");
    }

    #[test]
    fn test_week_key_crosses_year_boundary() {
        // 2027-01-01 is a Friday.
        assert_eq!(week_key(date("2027-01-01")), "2026-12-26");
        assert_eq!(month_key(date("2027-01-01")), "2027-01");
    }

    #[test]
    fn test_keys_use_local_date_not_utc() {
        // 23:30 in UTC+02:00 is still the 16th locally but 21:30 UTC; 00:30
        // local on the 17th is the 16th in UTC.
        let late = DateTime::parse_from_rfc3339("2026-10-16T23:30:00+02:00").unwrap();
        let early = DateTime::parse_from_rfc3339("2026-10-17T00:30:00+02:00").unwrap();

        assert_eq!(PeriodKeys::at(&late).day.to_string(), "2026-10-16");
        assert_eq!(PeriodKeys::at(&early).day.to_string(), "2026-10-17");
        assert_eq!(PeriodKeys::at(&early).week.to_string(), "2026-10-17");
        assert_eq!(PeriodKeys::at(&late).week.to_string(), "2026-10-10");
    }

    #[test]
    fn test_previous_keys() {
        let now = DateTime::parse_from_rfc3339("2026-03-06T12:00:00Z").unwrap();
        let prev = PeriodKeys::at(&now).previous();

        assert_eq!(prev.day.to_string(), "2026-03-05");
        // 2026-03-06 is a Friday; its week starts 2026-02-28.
        assert_eq!(prev.week.to_string(), "2026-02-21");
        assert_eq!(prev.month.to_string(), "2026-02");
    }

    #[test]
    fn test_month_arithmetic_wraps_years() {
        let jan: MonthKey = "2026-01".parse().unwrap();
        assert_eq!(jan.previous().to_string(), "2025-12");
        assert_eq!(jan.months_before(13).to_string(), "2024-12");
        assert_eq!(jan.index() - jan.months_before(12).index(), 12);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("2026-13".parse::<MonthKey>().is_err());
        assert!("2026-1".parse::<MonthKey>().is_err());
        assert!("not-a-date".parse::<DayKey>().is_err());
        assert!("2026-10-32".parse::<WeekKey>().is_err());
    }

    #[test]
    fn test_week_parse_normalizes_to_saturday() {
        let key: WeekKey = "2026-10-14".parse().unwrap();
        assert_eq!(key.to_string(), "2026-10-10");
        assert!(key.contains(date("2026-10-16")));
        assert!(!key.contains(date("2026-10-17")));
    }

    /// Collects formatted log output for assertions.
    #[derive(Clone, Default)]
    struct LogBuffer(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_week_parse_warns_on_non_saturday() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let _: WeekKey = "2026-10-17".parse().unwrap();
            assert!(logs.0.lock().unwrap().is_empty());
            let _: WeekKey = "2026-10-14".parse().unwrap();
        });

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("WARN"), "{output}");
        assert!(output.contains("week key is not a Saturday"), "{output}");
        assert!(output.contains("2026-10-10"), "{output}");
    }

    #[test]
    fn test_huge_lookbacks_saturate() {
        let day = DayKey::new(date("2026-10-17"));
        assert_eq!(day.days_before(u32::MAX).date(), NaiveDate::MIN);
        let week = WeekKey::containing(date("2026-10-17"));
        assert_eq!(week.weeks_before(u32::MAX).start(), NaiveDate::MIN);
        assert!(week.weeks_before(u32::MAX) < week);
    }

    #[test]
    fn test_day_key_serde_roundtrip() {
        let key = DayKey::new(date("2026-10-17"));
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"2026-10-17\"");
        let parsed: DayKey = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, key);
        assert_eq!(key.days_before(30), DayKey::new(date("2026-09-17")));
        assert_eq!(
            key.previous().date(),
            date("2026-10-17") - Duration::days(1)
        );
    }
}
