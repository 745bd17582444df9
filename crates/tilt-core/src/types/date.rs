//! Date type for return series and rebalance schedules.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};

/// A trading date.
///
/// This is a newtype wrapper around `chrono::NaiveDate` so that dates used as
/// matrix keys and period boundaries cannot be confused with other values.
///
/// # Example
///
/// ```rust
/// use tilt_core::types::Date;
///
/// let date = Date::parse("2023-11-30").unwrap();
/// assert_eq!(date.year(), 2023);
/// assert_eq!(date.quarter(), 4);
/// assert_eq!(date.add_days(1).to_string(), "2023-12-01");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Date(NaiveDate);

impl Date {
    /// Creates a new date from year, month, and day.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidDate` if the date is invalid.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> CoreResult<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Date)
            .ok_or_else(|| CoreError::invalid_date(format!("{year}-{month:02}-{day:02}")))
    }

    /// Creates a date from an ISO 8601 string (YYYY-MM-DD).
    ///
    /// Surrounding whitespace is ignored, and a trailing time component
    /// (`2023-11-30 00:00:00`) as written by spreadsheet exports is accepted.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidDate` if the string is not a valid date.
    pub fn parse(s: &str) -> CoreResult<Self> {
        let trimmed = s.trim();
        let day_part = trimmed.split([' ', 'T']).next().unwrap_or(trimmed);
        NaiveDate::parse_from_str(day_part, "%Y-%m-%d")
            .map(Date)
            .map_err(|_| CoreError::invalid_date(format!("Cannot parse: {s}")))
    }

    /// Returns the year component.
    #[must_use]
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Returns the month component (1-12).
    #[must_use]
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// Returns the day component (1-31).
    #[must_use]
    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// Returns the calendar quarter (1-4).
    #[must_use]
    pub fn quarter(&self) -> u32 {
        (self.month() - 1) / 3 + 1
    }

    /// Returns the ISO week as `(iso_year, week_number)`.
    #[must_use]
    pub fn iso_week(&self) -> (i32, u32) {
        let week = self.0.iso_week();
        (week.year(), week.week())
    }

    /// Returns the day of week.
    #[must_use]
    pub fn weekday(&self) -> Weekday {
        self.0.weekday()
    }

    /// Checks if the date is a weekend (Saturday or Sunday).
    #[must_use]
    pub fn is_weekend(&self) -> bool {
        matches!(self.weekday(), Weekday::Sat | Weekday::Sun)
    }

    /// Adds a number of days to the date.
    #[must_use]
    pub fn add_days(&self, days: i64) -> Self {
        Date(self.0 + chrono::Duration::days(days))
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for Date {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Date::parse(s)
    }
}

impl From<NaiveDate> for Date {
    fn from(date: NaiveDate) -> Self {
        Date(date)
    }
}

impl From<Date> for NaiveDate {
    fn from(date: Date) -> Self {
        date.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_ymd() {
        let date = Date::from_ymd(2024, 6, 3).unwrap();
        assert_eq!(date.year(), 2024);
        assert_eq!(date.month(), 6);
        assert_eq!(date.day(), 3);
        assert!(Date::from_ymd(2023, 2, 29).is_err());
    }

    #[test]
    fn test_parse_variants() {
        let plain = Date::parse("2023-12-04").unwrap();
        let with_time = Date::parse("2023-12-04 00:00:00").unwrap();
        let iso = Date::parse(" 2023-12-04T00:00:00 ").unwrap();
        assert_eq!(plain, with_time);
        assert_eq!(plain, iso);
        assert!(Date::parse("12/04/2023").is_err());
    }

    #[test]
    fn test_calendar_helpers() {
        let date = Date::from_ymd(2023, 12, 1).unwrap();
        assert_eq!(date.quarter(), 4);
        assert_eq!(date.weekday(), Weekday::Fri);
        assert!(date.add_days(1).is_weekend());
        assert_eq!(date.add_days(3).day(), 4);
        assert_eq!(date.iso_week(), (2023, 48));
    }

    #[test]
    fn test_serde_transparent() {
        let date = Date::from_ymd(2023, 11, 30).unwrap();
        let json = serde_json::to_string(&date).unwrap();
        assert_eq!(json, "\"2023-11-30\"");
        let back: Date = serde_json::from_str(&json).unwrap();
        assert_eq!(back, date);
    }
}
