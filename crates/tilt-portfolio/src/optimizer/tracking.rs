//! Tracking-error minimizing active weights.
//!
//! Given benchmark weights and historical returns, finds active weights `x`
//! that minimize the ex-ante active variance `xᵀ C x` subject to:
//!
//! - `benchmark_cash + x_cash >= cash_drag_floor`
//! - `Σ x_i = 0`
//! - `-bound <= x_i <= bound`
//!
//! The portfolio is then `benchmark + x`.

use serde::{Deserialize, Serialize};
use tilt_core::types::{SecurityId, WeightVector};
use tilt_math::linear_algebra::{is_positive_semidefinite, quadratic_form};
use tilt_math::optimization::{ClarabelSolver, ConstraintSense, QpSolver, QuadraticProgram};
use tracing::{debug, info};

use crate::error::{PortfolioError, PortfolioResult};
use crate::returns::ReturnsMatrix;
use crate::types::OptimizerConfig;

/// Result of an active-risk optimization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveRiskSolution {
    /// Optimal active weights `x`, cash last; sums to zero.
    pub active_weights: WeightVector,
    /// `benchmark + x`, cash last; sums to one. Not renormalized.
    pub portfolio_weights: WeightVector,
    /// One-day active variance `xᵀ C x` (unscaled).
    pub variance: f64,
    /// One-day tracking error in basis points.
    pub tracking_error_bps: f64,
    /// Solver iterations.
    pub iterations: u32,
}

/// Minimizes ex-ante tracking error against a benchmark.
#[derive(Debug, Clone)]
pub struct TrackingErrorOptimizer<S = ClarabelSolver> {
    solver: S,
    config: OptimizerConfig,
}

impl TrackingErrorOptimizer<ClarabelSolver> {
    /// Creates an optimizer backed by Clarabel.
    #[must_use]
    pub fn new(config: OptimizerConfig) -> Self {
        let solver = ClarabelSolver::new(config.qp_settings());
        Self { solver, config }
    }
}

impl Default for TrackingErrorOptimizer<ClarabelSolver> {
    fn default() -> Self {
        Self::new(OptimizerConfig::default())
    }
}

impl<S: QpSolver> TrackingErrorOptimizer<S> {
    /// Creates an optimizer with a custom QP backend.
    pub fn with_solver(solver: S, config: OptimizerConfig) -> Self {
        Self { solver, config }
    }

    /// The optimizer configuration.
    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Returns the portfolio weights `benchmark + x*`.
    ///
    /// # Errors
    ///
    /// See [`solve`](Self::solve).
    pub fn minimize_active_risk(
        &self,
        benchmark: &WeightVector,
        cash_drag_floor: f64,
        historical_returns: &ReturnsMatrix,
    ) -> PortfolioResult<WeightVector> {
        self.solve(benchmark, cash_drag_floor, historical_returns)
            .map(|s| s.portfolio_weights)
    }

    /// Solves for the minimum-tracking-error portfolio.
    ///
    /// # Errors
    ///
    /// - `Validation`: benchmark does not sum to one, bad floor, or fewer
    ///   than two rows of history
    /// - `DataGap`: a benchmark security is not a matrix column
    /// - `NumericalInstability`: covariance not PSD, solver trouble, or a
    ///   result that violates its constraints
    /// - `OptimizationInfeasible`: the cash floor cannot be met within bounds
    /// - `OptimizationTimeout`: the solver deadline passed
    pub fn solve(
        &self,
        benchmark: &WeightVector,
        cash_drag_floor: f64,
        historical_returns: &ReturnsMatrix,
    ) -> PortfolioResult<ActiveRiskSolution> {
        let tol = self.config.weight_tolerance;
        let bound = self.config.bound;

        self.validate_inputs(benchmark, cash_drag_floor)?;
        let benchmark = benchmark.with_cash_last();
        let ids: Vec<SecurityId> = benchmark.ids().cloned().collect();
        let n = ids.len();

        if let Some(missing) = ids
            .iter()
            .find(|id| !id.is_cash() && !historical_returns.contains(id))
        {
            return Err(PortfolioError::data_gap(
                missing.as_str(),
                "benchmark security has no return history",
            ));
        }

        let covariance = historical_returns.covariance(&ids)?;
        if !is_positive_semidefinite(&covariance, self.config.psd_tolerance)? {
            return Err(PortfolioError::numerical(
                "covariance matrix is not positive semi-definite",
            ));
        }

        let bench_cash = benchmark.cash_weight();
        let required_tilt = cash_drag_floor - bench_cash;
        if required_tilt > bound + tol {
            return Err(PortfolioError::infeasible(format!(
                "cash tilt {required_tilt:.6} exceeds the per-security bound {bound}"
            )));
        }
        if required_tilt > (n - 1) as f64 * bound + tol {
            return Err(PortfolioError::infeasible(format!(
                "cash tilt {required_tilt:.6} cannot be funded by {} securities within bound {bound}",
                n - 1
            )));
        }

        let mut problem = QuadraticProgram::new();
        let vars = problem.add_variables(ids.iter().map(SecurityId::to_string), -bound, bound);
        let cash_index = n - 1;
        problem.add_linear_constraint(
            "cash_drag_floor",
            vec![(cash_index, 1.0)],
            ConstraintSense::GreaterEqual,
            required_tilt,
        )?;
        problem.add_linear_constraint(
            "active_sum",
            vars.map(|i| (i, 1.0)).collect(),
            ConstraintSense::Equal,
            0.0,
        )?;
        problem.set_quadratic_objective(&covariance * self.config.objective_scale)?;

        debug!(
            securities = n,
            rows = historical_returns.len(),
            cash_drag_floor,
            bound,
            "solving active-risk problem"
        );
        let solution = self.solver.solve(&problem)?;
        let x = solution.values();

        let variance = quadratic_form(x, &covariance)?;
        self.check_solution(&benchmark, &ids, x, variance, cash_drag_floor)?;

        let active_weights: WeightVector =
            ids.iter().cloned().zip(x.iter().copied()).collect();
        let portfolio_weights = benchmark.plus(&active_weights);
        let variance = variance.max(0.0);
        let tracking_error_bps = 10_000.0 * variance.sqrt();

        info!(
            securities = n,
            tracking_error_bps,
            iterations = solution.iterations,
            "active-risk optimization solved"
        );

        Ok(ActiveRiskSolution {
            active_weights,
            portfolio_weights,
            variance,
            tracking_error_bps,
            iterations: solution.iterations,
        })
    }

    fn validate_inputs(&self, benchmark: &WeightVector, floor: f64) -> PortfolioResult<()> {
        let tol = self.config.weight_tolerance;
        if benchmark.is_empty() {
            return Err(PortfolioError::validation("benchmark", "benchmark is empty"));
        }
        if let Some((id, w)) = benchmark.first_non_finite() {
            return Err(PortfolioError::validation(
                format!("'{id}'"),
                format!("non-finite benchmark weight {w}"),
            ));
        }
        if !benchmark.is_fully_invested(tol) {
            return Err(PortfolioError::validation(
                "benchmark",
                format!("weights sum to {}, expected 1", benchmark.total()),
            ));
        }
        if !benchmark.ids().any(|id| !id.is_cash()) {
            return Err(PortfolioError::validation(
                "benchmark",
                "benchmark holds no non-cash securities",
            ));
        }
        if !floor.is_finite() || !(0.0..=1.0).contains(&floor) {
            return Err(PortfolioError::validation(
                "cash drag floor",
                format!("must lie in [0, 1], got {floor}"),
            ));
        }
        if !(self.config.bound.is_finite() && self.config.bound > 0.0) {
            return Err(PortfolioError::validation(
                "optimizer config",
                format!("bound must be positive, got {}", self.config.bound),
            ));
        }
        Ok(())
    }

    fn check_solution(
        &self,
        benchmark: &WeightVector,
        ids: &[SecurityId],
        x: &[f64],
        variance: f64,
        floor: f64,
    ) -> PortfolioResult<()> {
        let tol = self.config.weight_tolerance;
        let bound = self.config.bound;

        let active_sum: f64 = x.iter().sum();
        if (benchmark.total() + active_sum - 1.0).abs() > tol {
            return Err(PortfolioError::numerical(format!(
                "optimized weights sum to {}, expected 1",
                benchmark.total() + active_sum
            )));
        }
        if let Some((id, xi)) = ids.iter().zip(x).find(|(_, xi)| xi.abs() > bound + tol) {
            return Err(PortfolioError::numerical(format!(
                "active weight {xi} for '{id}' breaches bound {bound}"
            )));
        }
        let cash = benchmark.cash_weight() + x[x.len() - 1];
        if cash < floor - tol {
            return Err(PortfolioError::numerical(format!(
                "cash weight {cash} below floor {floor}"
            )));
        }
        if variance < -tol {
            return Err(PortfolioError::numerical(format!(
                "negative active variance {variance:e}"
            )));
        }
        Ok(())
    }
}

/// Minimizes active risk with the default Clarabel backend and
/// configuration, returning the portfolio weights.
///
/// # Errors
///
/// See [`TrackingErrorOptimizer::solve`].
pub fn minimize_active_risk(
    benchmark: &WeightVector,
    cash_drag_floor: f64,
    historical_returns: &ReturnsMatrix,
) -> PortfolioResult<WeightVector> {
    TrackingErrorOptimizer::default().minimize_active_risk(
        benchmark,
        cash_drag_floor,
        historical_returns,
    )
}
