//! Walk-forward backtests.
//!
//! A [`Strategy`] decides the starting weights and what happens at each
//! rebalance boundary; [`run_backtest`] drives the
//! [`CompoundingSimulator`] and summarizes the result.
//!
//! The reoptimizing strategy only ever sees returns strictly before the
//! boundary it is rebalancing at.

mod schedule;

use serde::{Deserialize, Serialize};
use tilt_core::types::{Date, WeightVector};
use tilt_math::optimization::QpSolver;
use tracing::info;

use crate::error::{PortfolioError, PortfolioResult};
use crate::optimizer::TrackingErrorOptimizer;
use crate::returns::ReturnsMatrix;
use crate::simulation::{
    cumulative_return, portfolio_period_returns, CompoundingSimulator, PeriodAttribution,
    PeriodReturn, RebalancePolicy,
};
use crate::types::SimulationConfig;

pub use schedule::{boundary_dates, BoundaryFrequency};

/// How weights are set at the start and at each boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Strategy {
    /// Start from `weights` and let them drift.
    BuyAndHold {
        /// Starting weights.
        weights: WeightVector,
    },
    /// Reset to `target` at every boundary.
    Rebalance {
        /// Target weights.
        target: WeightVector,
    },
    /// Re-solve the tracking-error problem at every boundary.
    Reoptimize {
        /// Benchmark weights.
        benchmark: WeightVector,
        /// Minimum portfolio cash weight.
        cash_drag_floor: f64,
        /// Use only the last `lookback` rows of history; all rows if `None`.
        #[serde(default)]
        lookback: Option<usize>,
    },
}

/// Outcome of a backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Per-security, per-period attribution rows.
    pub rows: Vec<PeriodAttribution>,
    /// Portfolio return of each period.
    pub periods: Vec<PeriodReturn>,
    /// Compounded return over all periods.
    pub cumulative_return: f64,
}

struct FixedTarget<'a> {
    target: &'a WeightVector,
}

impl RebalancePolicy for FixedTarget<'_> {
    fn rebalance(
        &mut self,
        _boundary: Date,
        _history: &ReturnsMatrix,
        _drifted: &WeightVector,
    ) -> PortfolioResult<Option<WeightVector>> {
        Ok(Some(self.target.clone()))
    }
}

struct Reoptimize<'a, S> {
    optimizer: &'a TrackingErrorOptimizer<S>,
    benchmark: &'a WeightVector,
    cash_drag_floor: f64,
    lookback: Option<usize>,
}

impl<S: QpSolver> Reoptimize<'_, S> {
    fn solve(&self, history: &ReturnsMatrix) -> PortfolioResult<WeightVector> {
        let history = match self.lookback {
            Some(n) => history.tail(n),
            None => history.clone(),
        };
        self.optimizer
            .minimize_active_risk(self.benchmark, self.cash_drag_floor, &history)
    }
}

impl<S: QpSolver> RebalancePolicy for Reoptimize<'_, S> {
    fn rebalance(
        &mut self,
        _boundary: Date,
        history: &ReturnsMatrix,
        _drifted: &WeightVector,
    ) -> PortfolioResult<Option<WeightVector>> {
        self.solve(history).map(Some)
    }
}

/// Runs `strategy` over `boundaries`.
///
/// For [`Strategy::Reoptimize`] the starting weights are solved on the rows
/// strictly before the first boundary, so the first boundary must leave at
/// least two rows of history.
///
/// # Errors
///
/// Any error from the optimizer or the simulator.
pub fn run_backtest<S: QpSolver>(
    returns: &ReturnsMatrix,
    boundaries: &[Date],
    strategy: &Strategy,
    optimizer: &TrackingErrorOptimizer<S>,
    sim_config: &SimulationConfig,
) -> PortfolioResult<BacktestReport> {
    let simulator = CompoundingSimulator::new(sim_config.clone());
    let first = boundaries.iter().min().copied().ok_or_else(|| {
        PortfolioError::validation("boundary dates", "no boundary dates given")
    })?;

    let rows = match strategy {
        Strategy::BuyAndHold { weights } => simulator.simulate(boundaries, weights, returns)?,
        Strategy::Rebalance { target } => simulator.simulate_with(
            boundaries,
            target,
            returns,
            &mut FixedTarget { target },
        )?,
        Strategy::Reoptimize {
            benchmark,
            cash_drag_floor,
            lookback,
        } => {
            let mut policy = Reoptimize {
                optimizer,
                benchmark,
                cash_drag_floor: *cash_drag_floor,
                lookback: *lookback,
            };
            let initial = policy.solve(&returns.before(first))?;
            simulator.simulate_with(boundaries, &initial, returns, &mut policy)?
        }
    };

    let periods = portfolio_period_returns(&rows);
    let cumulative = cumulative_return(&periods);
    info!(
        periods = periods.len(),
        cumulative_return = cumulative,
        "backtest complete"
    );

    Ok(BacktestReport {
        rows,
        periods,
        cumulative_return: cumulative,
    })
}
