//! Total-return series and aligned returns matrices.
//!
//! - [`build_total_return`]: dividend-reinvested price series for one security
//! - [`daily_returns`]: current-day-denominator daily returns
//! - [`assemble_from_series`] / [`ReturnsMatrixAssembler`]: aligned
//!   [`ReturnsMatrix`] with a synthetic zero cash column

mod matrix;
mod parallel;
mod total_return;

pub use matrix::{assemble_from_series, ReturnsMatrix, ReturnsMatrixAssembler};
pub use parallel::maybe_parallel_map;
pub use total_return::{build_total_return, build_total_returns, daily_returns};
