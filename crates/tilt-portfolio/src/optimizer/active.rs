//! Active weights and ex-ante tracking error reporting.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use tilt_core::types::{SecurityId, WeightVector};
use tilt_math::linear_algebra::quadratic_form;

use crate::error::{PortfolioError, PortfolioResult};

/// Active weight for a single security.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveWeight {
    /// Portfolio weight (fraction).
    pub portfolio_weight: f64,

    /// Benchmark weight (fraction).
    pub benchmark_weight: f64,

    /// Active weight = portfolio - benchmark (can be negative).
    pub active_weight: f64,

    /// Relative weight = portfolio / benchmark (ratio).
    pub relative_weight: Option<f64>,
}

impl ActiveWeight {
    /// Creates a new active weight.
    #[must_use]
    pub fn new(portfolio_weight: f64, benchmark_weight: f64) -> Self {
        let active_weight = portfolio_weight - benchmark_weight;
        let relative_weight = if benchmark_weight > 0.0 {
            Some(portfolio_weight / benchmark_weight)
        } else {
            None
        };

        Self {
            portfolio_weight,
            benchmark_weight,
            active_weight,
            relative_weight,
        }
    }

    /// Returns true if this is an overweight position.
    #[must_use]
    pub fn is_overweight(&self) -> bool {
        self.active_weight > 0.0
    }

    /// Returns true if this is an underweight position.
    #[must_use]
    pub fn is_underweight(&self) -> bool {
        self.active_weight < 0.0
    }
}

/// Per-security active weights of a portfolio against its benchmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveWeights {
    /// Active weights in benchmark order, then portfolio-only securities.
    pub by_security: Vec<(SecurityId, ActiveWeight)>,

    /// Sum of absolute active weights.
    pub total_active_weight: f64,

    /// Number of overweight positions.
    pub overweight_count: usize,

    /// Number of underweight positions.
    pub underweight_count: usize,
}

impl ActiveWeights {
    /// Returns the largest active positions by absolute weight.
    #[must_use]
    pub fn largest_active_positions(&self, n: usize) -> Vec<(&SecurityId, f64)> {
        let mut positions: Vec<_> = self
            .by_security
            .iter()
            .map(|(id, w)| (id, w.active_weight))
            .collect();

        positions.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
        positions.into_iter().take(n).collect()
    }

    /// Active weight of one security.
    #[must_use]
    pub fn get(&self, id: &SecurityId) -> Option<&ActiveWeight> {
        self.by_security.iter().find(|(k, _)| k == id).map(|(_, w)| w)
    }
}

/// Compares a portfolio with its benchmark security by security.
///
/// Securities missing on one side count as weight 0.
#[must_use]
pub fn active_weights(portfolio: &WeightVector, benchmark: &WeightVector) -> ActiveWeights {
    let mut ids: Vec<&SecurityId> = benchmark.ids().collect();
    ids.extend(portfolio.ids().filter(|id| !benchmark.contains(id)));

    let by_security: Vec<(SecurityId, ActiveWeight)> = ids
        .into_iter()
        .map(|id| {
            let w = ActiveWeight::new(
                portfolio.get(id).unwrap_or(0.0),
                benchmark.get(id).unwrap_or(0.0),
            );
            (id.clone(), w)
        })
        .collect();

    ActiveWeights {
        total_active_weight: by_security.iter().map(|(_, w)| w.active_weight.abs()).sum(),
        overweight_count: by_security.iter().filter(|(_, w)| w.is_overweight()).count(),
        underweight_count: by_security.iter().filter(|(_, w)| w.is_underweight()).count(),
        by_security,
    }
}

/// One-day ex-ante active risk in basis points, `10_000 * sqrt(xᵀ C x)`.
///
/// `active` must be in the same order as the covariance rows.
///
/// # Errors
///
/// `Validation` on a dimension mismatch; `NumericalInstability` when the
/// variance is negative beyond rounding.
pub fn ex_ante_tracking_error_bps(
    active: &[f64],
    covariance: &DMatrix<f64>,
) -> PortfolioResult<f64> {
    let variance = quadratic_form(active, covariance)?;
    if variance < -1e-12 {
        return Err(PortfolioError::numerical(format!(
            "active variance is negative ({variance:e})"
        )));
    }
    Ok(10_000.0 * variance.max(0.0).sqrt())
}

/// The naive way to hold a cash-drag floor: scale every non-cash benchmark
/// weight by `(1 - floor) / (1 - benchmark_cash)` and hold `floor` in cash.
///
/// The result is cash-last and sums to one.
///
/// # Errors
///
/// `Validation` when the floor is outside `[0, 1]` or the benchmark is all
/// cash.
pub fn naive_cash_drag_tilt(benchmark: &WeightVector, floor: f64) -> PortfolioResult<WeightVector> {
    if !(0.0..=1.0).contains(&floor) {
        return Err(PortfolioError::validation(
            "cash drag floor",
            format!("must lie in [0, 1], got {floor}"),
        ));
    }
    let bench_cash = benchmark.cash_weight();
    if bench_cash >= 1.0 {
        return Err(PortfolioError::validation(
            "benchmark",
            "benchmark holds no non-cash securities",
        ));
    }

    let scale = (1.0 - floor) / (1.0 - bench_cash);
    let mut out: WeightVector = benchmark
        .iter()
        .filter(|(id, _)| !id.is_cash())
        .map(|(id, w)| (id.clone(), w * scale))
        .collect();
    out.insert(SecurityId::cash(), floor);
    Ok(out)
}
