//! Rebalance boundary schedules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tilt_core::types::Date;

use crate::error::PortfolioError;

/// How often to place rebalance boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryFrequency {
    /// Every trading day.
    Daily,
    /// Last trading day of each ISO week.
    Weekly,
    /// Last trading day of each month.
    #[default]
    Monthly,
    /// Last trading day of each calendar quarter.
    Quarterly,
}

impl BoundaryFrequency {
    fn period_key(self, date: Date) -> (i32, u32) {
        match self {
            Self::Daily => (date.year(), date.month() * 32 + date.day()),
            Self::Weekly => date.iso_week(),
            Self::Monthly => (date.year(), date.month()),
            Self::Quarterly => (date.year(), date.quarter()),
        }
    }
}

impl fmt::Display for BoundaryFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
        };
        f.write_str(s)
    }
}

impl FromStr for BoundaryFrequency {
    type Err = PortfolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" | "d" => Ok(Self::Daily),
            "weekly" | "w" => Ok(Self::Weekly),
            "monthly" | "m" => Ok(Self::Monthly),
            "quarterly" | "q" => Ok(Self::Quarterly),
            other => Err(PortfolioError::validation(
                "boundary frequency",
                format!("unknown frequency '{other}'"),
            )),
        }
    }
}

/// Boundary dates for a trading calendar: the first date, then the last
/// trading date of every period.
///
/// `dates` must be sorted ascending.
#[must_use]
pub fn boundary_dates(dates: &[Date], frequency: BoundaryFrequency) -> Vec<Date> {
    let Some(&first) = dates.first() else {
        return Vec::new();
    };

    let mut out = vec![first];
    for (i, &date) in dates.iter().enumerate() {
        let period_end = dates
            .get(i + 1)
            .map_or(true, |next| frequency.period_key(*next) != frequency.period_key(date));
        if period_end && date != first {
            out.push(date);
        }
    }
    out
}
