//! # Tilt Portfolio
//!
//! Return construction, active-risk optimization and weight-drift
//! simulation for equity portfolios.
//!
//! ## Design Philosophy
//!
//! - **Pure functions**: All calculations take explicit inputs; price data
//!   arrives through [`PriceHistorySource`](tilt_core::traits::PriceHistorySource)
//! - **Cash is a column**: Every returns matrix carries a synthetic zero-return
//!   cash column in last position, and every optimized weight vector ends in cash
//! - **Config-driven parallelism**: Optional rayon support with threshold-based switching
//!
//! ## Features
//!
//! - **Total Return**: Dividend-reinvested price series
//! - **Returns Matrix**: Union-axis daily returns with gap filling
//! - **Tracking Error**: Minimum active variance under a cash-drag floor
//! - **Simulation**: Per-period attribution with weight drift
//! - **Backtests**: Buy-and-hold, fixed-target and walk-forward reoptimizing strategies
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tilt_portfolio::prelude::*;
//!
//! let assembler = ReturnsMatrixAssembler::new(source);
//! let returns = assembler.assemble(&ids, &DateRange::unbounded())?;
//!
//! let weights = minimize_active_risk(&benchmark, 0.0005, &returns)?;
//! let rows = CompoundingSimulator::default().simulate(&boundaries, &weights, &returns)?;
//! ```
//!
//! ## Module Overview
//!
//! - [`returns`] - Total-return series and returns matrices
//! - [`optimizer`] - Tracking-error optimization and active weights
//! - [`simulation`] - Weight-drift compounding and attribution
//! - [`backtest`] - Strategies and boundary schedules
//! - [`types`] - Configuration
//!
//! ## Feature Flags
//!
//! - `parallel`: Build total-return series with rayon for large universes

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod backtest;
pub mod error;
pub mod optimizer;
pub mod returns;
pub mod simulation;
pub mod types;

// Re-export error types at crate root
pub use error::{PortfolioError, PortfolioResult};

// Re-export config types
pub use types::{GapPolicy, OptimizerConfig, ReturnsConfig, SimulationConfig};

// Re-export return construction
pub use returns::{
    assemble_from_series, build_total_return, build_total_returns, daily_returns,
    maybe_parallel_map, ReturnsMatrix, ReturnsMatrixAssembler,
};

// Re-export optimization
pub use optimizer::{
    active_weights, ex_ante_tracking_error_bps, minimize_active_risk, naive_cash_drag_tilt,
    ActiveRiskSolution, ActiveWeight, ActiveWeights, TrackingErrorOptimizer,
};

// Re-export simulation
pub use simulation::{
    cumulative_return, portfolio_period_returns, CompoundingSimulator, NoRebalance,
    PeriodAttribution, PeriodReturn, RebalancePolicy,
};

// Re-export backtests
pub use backtest::{boundary_dates, run_backtest, BacktestReport, BoundaryFrequency, Strategy};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::backtest::{
        boundary_dates, run_backtest, BacktestReport, BoundaryFrequency, Strategy,
    };
    pub use crate::error::{PortfolioError, PortfolioResult};
    pub use crate::optimizer::{minimize_active_risk, ActiveRiskSolution, TrackingErrorOptimizer};
    pub use crate::returns::{
        build_total_return, daily_returns, ReturnsMatrix, ReturnsMatrixAssembler,
    };
    pub use crate::simulation::{CompoundingSimulator, PeriodAttribution, RebalancePolicy};
    pub use crate::types::{GapPolicy, OptimizerConfig, ReturnsConfig, SimulationConfig};

    pub use tilt_core::prelude::*;
}
