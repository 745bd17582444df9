//! Error types for portfolio analytics.
//!
//! This module defines the error types used throughout the portfolio crate.
//! Errors from `tilt-core` and `tilt-math` convert into [`PortfolioError`]
//! so that `?` works across crate boundaries.

use std::time::Duration;

use thiserror::Error;
use tilt_core::{CoreError, Date};
use tilt_math::MathError;

/// Result type for portfolio operations.
pub type PortfolioResult<T> = Result<T, PortfolioError>;

/// Errors that can occur during portfolio operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PortfolioError {
    /// Malformed input: bad prices, weights that do not sum to one,
    /// duplicate securities, too little history.
    #[error("Validation failed for {context}: {reason}")]
    Validation {
        /// Security and/or date the input refers to.
        context: String,
        /// Why the input was rejected.
        reason: String,
    },

    /// Required return data is missing for a security.
    #[error("Data gap for '{security}': {detail}")]
    DataGap {
        /// The security lacking data.
        security: String,
        /// Which window or column is missing.
        detail: String,
    },

    /// The optimizer's constraint set admits no solution.
    #[error("Optimization infeasible: {reason}")]
    OptimizationInfeasible {
        /// Which constraints conflict.
        reason: String,
    },

    /// The QP solver exceeded its deadline.
    #[error("Optimization timed out after {limit:?}")]
    OptimizationTimeout {
        /// The configured deadline.
        limit: Duration,
    },

    /// Numerical breakdown: indefinite covariance, solver trouble, or
    /// weights that cannot be normalized.
    #[error("Numerical instability: {reason}")]
    NumericalInstability {
        /// What went wrong.
        reason: String,
    },

    /// A price-history source failed.
    #[error("Data source '{source_name}' failed: {reason}")]
    DataSource {
        /// Name of the failing source.
        source_name: String,
        /// Underlying failure.
        reason: String,
    },
}

impl PortfolioError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            context: context.into(),
            reason: reason.into(),
        }
    }

    /// Create a validation error for a security on a given date.
    #[must_use]
    pub fn validation_at(security: impl AsRef<str>, date: Date, reason: impl Into<String>) -> Self {
        Self::validation(format!("'{}' on {}", security.as_ref(), date), reason)
    }

    /// Create a data gap error.
    #[must_use]
    pub fn data_gap(security: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::DataGap {
            security: security.into(),
            detail: detail.into(),
        }
    }

    /// Create a data gap error for a `(start, end]` window.
    #[must_use]
    pub fn data_gap_window(security: impl Into<String>, start: Date, end: Date) -> Self {
        Self::data_gap(security, format!("no returns for window ({start}, {end}]"))
    }

    /// Create an infeasibility error.
    #[must_use]
    pub fn infeasible(reason: impl Into<String>) -> Self {
        Self::OptimizationInfeasible {
            reason: reason.into(),
        }
    }

    /// Create a numerical instability error.
    #[must_use]
    pub fn numerical(reason: impl Into<String>) -> Self {
        Self::NumericalInstability {
            reason: reason.into(),
        }
    }
}

impl From<CoreError> for PortfolioError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidDate { message } => Self::validation("date", message),
            CoreError::Validation { security, reason } => {
                Self::validation(format!("'{security}'"), reason)
            }
            CoreError::DataSource {
                source_name,
                reason,
            } => Self::DataSource {
                source_name,
                reason,
            },
        }
    }
}

impl From<MathError> for PortfolioError {
    fn from(err: MathError) -> Self {
        match err {
            MathError::Infeasible { reason } => Self::infeasible(reason),
            MathError::Timeout { limit } => Self::OptimizationTimeout { limit },
            MathError::InsufficientData { required, actual } => Self::validation(
                "returns history",
                format!("insufficient history: need at least {required} rows, got {actual}"),
            ),
            MathError::InvalidInput { reason } => Self::validation("optimizer input", reason),
            MathError::DimensionMismatch { .. } => {
                Self::validation("optimizer input", err.to_string())
            }
            MathError::ConvergenceFailed { .. }
            | MathError::NumericalInstability { .. }
            | MathError::SolverFailed { .. } => Self::numerical(err.to_string()),
        }
    }
}
