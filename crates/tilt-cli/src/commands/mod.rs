//! CLI command implementations.

pub mod backtest;
pub mod optimize;
pub mod results;
pub mod returns;
pub mod total_return;

// Re-export submodules for convenience
pub use backtest::BacktestArgs;
pub use optimize::OptimizeArgs;
pub use results::ResultsArgs;
pub use returns::ReturnsArgs;
pub use total_return::TotalReturnArgs;

use tilt_core::types::Date;

use crate::error::{CliError, CliResult};

/// Parses a date string in YYYY-MM-DD format.
pub fn parse_date(s: &str) -> CliResult<Date> {
    Date::parse(s).map_err(|_| CliError::InvalidDate(s.to_string()))
}

/// Validates a weight-like fraction in `[0, 1]`.
pub fn validate_fraction(name: &'static str, value: f64) -> CliResult<f64> {
    if !(0.0..=1.0).contains(&value) {
        return Err(CliError::InvalidFraction { name, value });
    }
    Ok(value)
}
