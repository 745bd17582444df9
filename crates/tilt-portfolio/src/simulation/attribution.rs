//! Per-period attribution rows and the portfolio returns derived from them.

use serde::{Deserialize, Serialize};
use tilt_core::types::{Date, SecurityId};

/// One security's contribution over one `(start_date, end_date]` period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodAttribution {
    /// The security.
    pub security: SecurityId,
    /// Period start (exclusive for returns).
    pub start_date: Date,
    /// Period end (inclusive for returns).
    pub end_date: Date,
    /// Weight at the start of the period.
    pub start_wt: f64,
    /// Compounded return over the period; `None` when the security was
    /// excluded for a data gap.
    pub period_return: Option<f64>,
    /// Drifted, normalized weight at the end of the period.
    pub end_wt: f64,
}

impl PeriodAttribution {
    /// Contribution to the portfolio period return, `start_wt * r`.
    #[must_use]
    pub fn contribution(&self) -> f64 {
        self.start_wt * self.period_return.unwrap_or(0.0)
    }
}

/// Portfolio-level return of one period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodReturn {
    /// Period start.
    pub start_date: Date,
    /// Period end.
    pub end_date: Date,
    /// `Σ start_wt_i * r_i`.
    pub portfolio_return: f64,
}

/// Groups rows by `(start_date, end_date)` and sums their contributions.
///
/// Periods are returned in order of first appearance.
#[must_use]
pub fn portfolio_period_returns(rows: &[PeriodAttribution]) -> Vec<PeriodReturn> {
    let mut periods: Vec<PeriodReturn> = Vec::new();
    for row in rows {
        match periods
            .iter_mut()
            .rev()
            .find(|p| p.start_date == row.start_date && p.end_date == row.end_date)
        {
            Some(p) => p.portfolio_return += row.contribution(),
            None => periods.push(PeriodReturn {
                start_date: row.start_date,
                end_date: row.end_date,
                portfolio_return: row.contribution(),
            }),
        }
    }
    periods
}

/// Compounds period returns, `Π(1 + R_k) - 1`.
#[must_use]
pub fn cumulative_return(periods: &[PeriodReturn]) -> f64 {
    periods
        .iter()
        .fold(1.0, |acc, p| acc * (1.0 + p.portfolio_return))
        - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn row(id: &str, start: &str, end: &str, wt: f64, r: Option<f64>) -> PeriodAttribution {
        PeriodAttribution {
            security: SecurityId::new(id),
            start_date: Date::parse(start).unwrap(),
            end_date: Date::parse(end).unwrap(),
            start_wt: wt,
            period_return: r,
            end_wt: 0.0,
        }
    }

    #[test]
    fn test_period_returns_and_compounding() {
        let rows = vec![
            row("A", "2024-01-01", "2024-01-31", 0.5, Some(0.02)),
            row("B", "2024-01-01", "2024-01-31", 0.5, Some(-0.01)),
            row("A", "2024-01-31", "2024-02-29", 0.6, Some(0.01)),
            row("B", "2024-01-31", "2024-02-29", 0.4, None),
        ];
        let periods = portfolio_period_returns(&rows);
        assert_eq!(periods.len(), 2);
        assert_relative_eq!(periods[0].portfolio_return, 0.005, epsilon = 1e-15);
        assert_relative_eq!(periods[1].portfolio_return, 0.006, epsilon = 1e-15);
        assert_relative_eq!(
            cumulative_return(&periods),
            1.005 * 1.006 - 1.0,
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_cumulative_of_nothing() {
        assert_relative_eq!(cumulative_return(&[]), 0.0);
    }
}
