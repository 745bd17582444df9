//! Error types for the Tilt core crate.
//!
//! These errors cover malformed domain values and failures reported by
//! price-history sources. Higher-level crates wrap them in their own enums.

use thiserror::Error;

/// A specialized Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// The error type for core operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Error in date parsing or an invalid calendar date.
    #[error("Invalid date: {message}")]
    InvalidDate {
        /// Description of the date error.
        message: String,
    },

    /// Malformed input data for a security.
    #[error("Validation failed for '{security}': {reason}")]
    Validation {
        /// Security the input belongs to.
        security: String,
        /// Why the input was rejected.
        reason: String,
    },

    /// A price-history source could not produce data.
    #[error("Data source '{source_name}' failed: {reason}")]
    DataSource {
        /// Name of the failing source (file path, provider id, ...).
        source_name: String,
        /// Underlying failure.
        reason: String,
    },
}

impl CoreError {
    /// Creates an invalid date error.
    #[must_use]
    pub fn invalid_date(message: impl Into<String>) -> Self {
        Self::InvalidDate {
            message: message.into(),
        }
    }

    /// Creates a validation error for a security.
    #[must_use]
    pub fn validation(security: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            security: security.into(),
            reason: reason.into(),
        }
    }

    /// Creates a data-source error.
    #[must_use]
    pub fn data_source(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DataSource {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::invalid_date("2024-02-30 is not a valid date");
        assert!(err.to_string().contains("Invalid date"));

        let err = CoreError::validation("BNS CN", "no market data file");
        assert!(err.to_string().contains("BNS CN"));
        assert!(err.to_string().contains("no market data file"));
    }

    #[test]
    fn test_data_source_error() {
        let err = CoreError::data_source("market_data/TD.csv", "bad header");
        assert_eq!(
            err.to_string(),
            "Data source 'market_data/TD.csv' failed: bad header"
        );
    }
}
