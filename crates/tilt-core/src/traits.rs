//! Core traits for the Tilt library.
//!
//! - [`PriceHistorySource`]: where the analytics obtain raw price and dividend
//!   history. File loaders, databases, and in-memory fixtures all implement it.

use std::collections::BTreeMap;

use crate::error::{CoreError, CoreResult};
use crate::types::{DateRange, PriceHistory, SecurityId};

/// Supplies per-security price histories with dividends merged in.
///
/// Implementations must return observations in date order, one per trading
/// day, restricted to `range`.
pub trait PriceHistorySource {
    /// Loads the price history of `security` within `range`.
    ///
    /// # Errors
    ///
    /// `CoreError::Validation` when the security has no price data at all,
    /// `CoreError::DataSource` for I/O or parse failures.
    fn price_history(&self, security: &SecurityId, range: &DateRange) -> CoreResult<PriceHistory>;
}

impl<T: PriceHistorySource + ?Sized> PriceHistorySource for &T {
    fn price_history(&self, security: &SecurityId, range: &DateRange) -> CoreResult<PriceHistory> {
        (**self).price_history(security, range)
    }
}

/// An in-memory source keyed by security id.
///
/// Useful for tests and for callers that already hold histories in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPriceSource {
    histories: BTreeMap<SecurityId, PriceHistory>,
}

impl InMemoryPriceSource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a history, replacing any previous one for the same security.
    #[must_use]
    pub fn with_history(mut self, history: PriceHistory) -> Self {
        self.histories.insert(history.security.clone(), history);
        self
    }
}

impl PriceHistorySource for InMemoryPriceSource {
    fn price_history(&self, security: &SecurityId, range: &DateRange) -> CoreResult<PriceHistory> {
        self.histories
            .get(security)
            .map(|h| h.restrict(range))
            .ok_or_else(|| CoreError::validation(security.as_str(), "no market data available"))
    }
}
