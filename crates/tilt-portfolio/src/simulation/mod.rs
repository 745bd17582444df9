//! Weight-drift compounding across rebalance boundaries.
//!
//! - [`CompoundingSimulator`]: per-period, per-security attribution rows
//! - [`RebalancePolicy`]: hook for replacing drifted weights at a boundary
//! - [`portfolio_period_returns`], [`cumulative_return`]: derived portfolio
//!   returns

mod attribution;
mod simulator;

pub use attribution::{cumulative_return, portfolio_period_returns, PeriodAttribution, PeriodReturn};
pub use simulator::{CompoundingSimulator, NoRebalance, RebalancePolicy};
