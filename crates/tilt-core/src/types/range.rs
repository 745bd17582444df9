//! Inclusive date ranges used to bound training and evaluation data.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Date;

/// An inclusive, optionally open-ended date range.
///
/// `None` on either side means unbounded on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First date included (inclusive).
    pub start: Option<Date>,
    /// Last date included (inclusive).
    pub end: Option<Date>,
}

impl DateRange {
    /// A range with no bounds.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// A range bounded on both sides.
    #[must_use]
    pub fn new(start: Date, end: Date) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Sets the start bound.
    #[must_use]
    pub fn with_start(mut self, start: Date) -> Self {
        self.start = Some(start);
        self
    }

    /// Sets the end bound.
    #[must_use]
    pub fn with_end(mut self, end: Date) -> Self {
        self.end = Some(end);
        self
    }

    /// Returns true if `date` falls inside the range.
    #[must_use]
    pub fn contains(&self, date: Date) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }

    /// Returns true if the start bound lies after the end bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!((self.start, self.end), (Some(s), Some(e)) if s > e)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = self.start.map_or_else(|| "..".to_string(), |d| d.to_string());
        let end = self.end.map_or_else(|| "..".to_string(), |d| d.to_string());
        write!(f, "[{start}, {end}]")
    }
}
