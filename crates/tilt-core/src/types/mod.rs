//! Domain types for portfolio return analytics.
//!
//! - [`Date`]: Trading date
//! - [`SecurityId`]: Ticker-style security identifier, with a reserved cash id
//! - [`DateRange`]: Inclusive, optionally open-ended date bounds
//! - [`PriceObservation`], [`PriceHistory`], [`DividendSchedule`]: Raw inputs
//! - [`TotalReturnSeries`]: Dividend-reinvested price series
//! - [`WeightVector`]: Ordered security weights

mod date;
mod price;
mod range;
mod security;
mod weights;

pub use date::Date;
pub use price::{
    DividendSchedule, PriceHistory, PriceObservation, TotalReturnPoint, TotalReturnSeries,
};
pub use range::DateRange;
pub use security::{SecurityId, CASH_ID};
pub use weights::WeightVector;
