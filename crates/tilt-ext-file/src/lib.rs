//! # Tilt Ext File
//!
//! File-based market data and result files for Tilt.
//!
//! This crate provides:
//! - [`CsvMarketData`]: a [`PriceHistorySource`](tilt_core::traits::PriceHistorySource)
//!   over per-security price CSVs and a shared dividends CSV
//! - Attribution result files ([`write_attribution_csv`], [`read_attribution_csv`])
//! - Returns matrix export ([`write_returns_csv`])

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod market_data;
mod results;

pub use error::{FileError, FileResult};
pub use market_data::{CsvMarketData, DEFAULT_DIVIDENDS_FILE};
pub use results::{
    read_attribution_csv, write_attribution, write_attribution_csv, write_returns,
    write_returns_csv,
};
