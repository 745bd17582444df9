//! Price, dividend, and total-return series for a single security.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Date, DateRange, SecurityId};
use crate::error::{CoreError, CoreResult};

/// One trading day's closing price and optional ex-dividend amount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    /// Trading date.
    pub date: Date,
    /// Closing (last) price.
    pub last_price: f64,
    /// Cash dividend going ex on this date, if any.
    pub dividend: Option<f64>,
}

impl PriceObservation {
    /// Creates an observation without a dividend.
    #[must_use]
    pub fn new(date: Date, last_price: f64) -> Self {
        Self {
            date,
            last_price,
            dividend: None,
        }
    }

    /// Creates an observation carrying an ex-dividend amount.
    #[must_use]
    pub fn with_dividend(date: Date, last_price: f64, dividend: f64) -> Self {
        Self {
            date,
            last_price,
            dividend: Some(dividend),
        }
    }
}

/// Cash dividends of one security keyed by ex-date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DividendSchedule {
    amounts: BTreeMap<Date, f64>,
}

impl DividendSchedule {
    /// Creates an empty schedule.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the dividend for an ex-date.
    pub fn insert(&mut self, ex_date: Date, amount: f64) {
        self.amounts.insert(ex_date, amount);
    }

    /// Returns the dividend going ex on `date`.
    #[must_use]
    pub fn get(&self, date: Date) -> Option<f64> {
        self.amounts.get(&date).copied()
    }

    /// Number of ex-dates in the schedule.
    #[must_use]
    pub fn len(&self) -> usize {
        self.amounts.len()
    }

    /// True if there are no dividends.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }

    /// Iterates `(ex_date, amount)` in date order.
    pub fn iter(&self) -> impl Iterator<Item = (Date, f64)> + '_ {
        self.amounts.iter().map(|(d, a)| (*d, *a))
    }

    /// Returns the schedule restricted to `range`.
    #[must_use]
    pub fn restrict(&self, range: &DateRange) -> Self {
        self.iter()
            .filter(|(d, _)| range.contains(*d))
            .collect()
    }

    /// Ex-dates that do not coincide with any observation of `history`.
    ///
    /// These dividends cannot be reinvested and are dropped when the schedule
    /// is merged onto the price history.
    #[must_use]
    pub fn unmatched_dates(&self, history: &PriceHistory) -> Vec<Date> {
        self.amounts
            .keys()
            .filter(|d| {
                history
                    .observations
                    .binary_search_by(|o| o.date.cmp(d))
                    .is_err()
            })
            .copied()
            .collect()
    }
}

impl FromIterator<(Date, f64)> for DividendSchedule {
    fn from_iter<I: IntoIterator<Item = (Date, f64)>>(iter: I) -> Self {
        Self {
            amounts: iter.into_iter().collect(),
        }
    }
}

/// Ordered daily price history of one security.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    /// Security the prices belong to.
    pub security: SecurityId,
    /// Observations in date order.
    pub observations: Vec<PriceObservation>,
}

impl PriceHistory {
    /// Creates a history from observations, sorting them by date.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` if two observations share a date.
    pub fn new(security: SecurityId, mut observations: Vec<PriceObservation>) -> CoreResult<Self> {
        observations.sort_by_key(|o| o.date);
        if let Some(pair) = observations.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(CoreError::validation(
                security.as_str(),
                format!("duplicate observation on {}", pair[0].date),
            ));
        }
        Ok(Self {
            security,
            observations,
        })
    }

    /// Builds a history from closing prices, mapping each dividend onto the
    /// trading day with the same date.
    ///
    /// Dividends whose ex-date is not a trading day are dropped; see
    /// [`DividendSchedule::unmatched_dates`].
    pub fn from_closes(
        security: SecurityId,
        closes: impl IntoIterator<Item = (Date, f64)>,
        dividends: &DividendSchedule,
    ) -> CoreResult<Self> {
        let observations = closes
            .into_iter()
            .map(|(date, price)| PriceObservation {
                date,
                last_price: price,
                dividend: dividends.get(date),
            })
            .collect();
        Self::new(security, observations)
    }

    /// Returns the history restricted to `range`.
    #[must_use]
    pub fn restrict(&self, range: &DateRange) -> Self {
        Self {
            security: self.security.clone(),
            observations: self
                .observations
                .iter()
                .filter(|o| range.contains(o.date))
                .copied()
                .collect(),
        }
    }

    /// Number of observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// True if there are no observations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// One point of a dividend-reinvested price series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TotalReturnPoint {
    /// Trading date.
    pub date: Date,
    /// Price including reinvested dividends.
    pub total_return_price: f64,
}

/// A security's dividend-reinvested price series.
///
/// Dates are strictly increasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalReturnSeries {
    security: SecurityId,
    points: Vec<TotalReturnPoint>,
}

impl TotalReturnSeries {
    /// Creates a series.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` if dates are not strictly increasing.
    pub fn new(security: SecurityId, points: Vec<TotalReturnPoint>) -> CoreResult<Self> {
        if let Some(pair) = points.windows(2).find(|w| w[0].date >= w[1].date) {
            return Err(CoreError::validation(
                security.as_str(),
                format!(
                    "total-return dates must be strictly increasing ({} then {})",
                    pair[0].date, pair[1].date
                ),
            ));
        }
        Ok(Self { security, points })
    }

    /// Security the series belongs to.
    #[must_use]
    pub fn security(&self) -> &SecurityId {
        &self.security
    }

    /// Points in date order.
    #[must_use]
    pub fn points(&self) -> &[TotalReturnPoint] {
        &self.points
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the series has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterates the dates.
    pub fn dates(&self) -> impl Iterator<Item = Date> + '_ {
        self.points.iter().map(|p| p.date)
    }

    /// Total-return price on `date`.
    #[must_use]
    pub fn price_on(&self, date: Date) -> Option<f64> {
        self.points
            .binary_search_by(|p| p.date.cmp(&date))
            .ok()
            .map(|i| self.points[i].total_return_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Date {
        Date::parse(s).unwrap()
    }

    #[test]
    fn test_from_closes_maps_dividends() {
        let dividends: DividendSchedule = [(d("2023-12-01"), 1.0), (d("2023-12-02"), 0.5)]
            .into_iter()
            .collect();
        let history = PriceHistory::from_closes(
            SecurityId::new("BNS CN"),
            vec![
                (d("2023-12-01"), 60.0),
                (d("2023-11-30"), 61.0),
                (d("2023-12-04"), 59.5),
            ],
            &dividends,
        )
        .unwrap();

        assert_eq!(history.len(), 3);
        assert_eq!(history.observations[0].date, d("2023-11-30"));
        assert_eq!(history.observations[1].dividend, Some(1.0));
        assert_eq!(history.observations[2].dividend, None);
        assert_eq!(dividends.unmatched_dates(&history), vec![d("2023-12-02")]);
    }

    #[test]
    fn test_duplicate_observation_rejected() {
        let result = PriceHistory::new(
            SecurityId::new("TD CN"),
            vec![
                PriceObservation::new(d("2023-12-01"), 80.0),
                PriceObservation::new(d("2023-12-01"), 81.0),
            ],
        );
        assert!(matches!(result, Err(CoreError::Validation { .. })));
    }

    #[test]
    fn test_restrict() {
        let history = PriceHistory::new(
            SecurityId::new("RY CN"),
            vec![
                PriceObservation::new(d("2023-11-29"), 120.0),
                PriceObservation::new(d("2023-11-30"), 121.0),
                PriceObservation::with_dividend(d("2023-12-01"), 122.0, 1.38),
            ],
        )
        .unwrap();
        let range = DateRange::unbounded().with_start(d("2023-11-30"));
        assert_eq!(history.restrict(&range).len(), 2);

        let schedule: DividendSchedule = [(d("2023-06-01"), 1.0)].into_iter().collect();
        assert!(schedule.restrict(&range).is_empty());
    }

    #[test]
    fn test_total_return_series_ordering() {
        let ok = TotalReturnSeries::new(
            SecurityId::new("NA CN"),
            vec![
                TotalReturnPoint {
                    date: d("2023-11-30"),
                    total_return_price: 100.0,
                },
                TotalReturnPoint {
                    date: d("2023-12-01"),
                    total_return_price: 101.0,
                },
            ],
        )
        .unwrap();
        assert_eq!(ok.price_on(d("2023-12-01")), Some(101.0));
        assert_eq!(ok.price_on(d("2023-12-02")), None);

        let bad = TotalReturnSeries::new(
            SecurityId::new("NA CN"),
            vec![
                TotalReturnPoint {
                    date: d("2023-12-01"),
                    total_return_price: 100.0,
                },
                TotalReturnPoint {
                    date: d("2023-12-01"),
                    total_return_price: 101.0,
                },
            ],
        );
        assert!(bad.is_err());
    }
}
