//! Security identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reserved identifier of the synthetic cash asset.
pub const CASH_ID: &str = "cash";

/// Identifier of a security, e.g. a Bloomberg-style ticker `"BNS CN"`.
///
/// The reserved id [`CASH_ID`] denotes the zero-return cash position.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecurityId(String);

impl SecurityId {
    /// Creates a security id from a ticker.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The cash asset id.
    #[must_use]
    pub fn cash() -> Self {
        Self(CASH_ID.to_string())
    }

    /// Returns true for the cash asset.
    #[must_use]
    pub fn is_cash(&self) -> bool {
        self.0 == CASH_ID
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the ticker without its exchange suffix (`"BNS CN"` -> `"BNS"`).
    #[must_use]
    pub fn root_ticker(&self) -> &str {
        self.0.split_whitespace().next().unwrap_or(&self.0)
    }
}

impl fmt::Display for SecurityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SecurityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SecurityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for SecurityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cash() {
        assert!(SecurityId::cash().is_cash());
        assert!(!SecurityId::new("TD CN").is_cash());
        assert_eq!(SecurityId::from("cash"), SecurityId::cash());
    }

    #[test]
    fn test_root_ticker() {
        assert_eq!(SecurityId::new("BNS CN").root_ticker(), "BNS");
        assert_eq!(SecurityId::new("AAPL").root_ticker(), "AAPL");
    }
}
