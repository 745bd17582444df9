//! Error types for mathematical operations.

use std::time::Duration;

use thiserror::Error;

/// A specialized Result type for mathematical operations.
pub type MathResult<T> = Result<T, MathError>;

/// Errors that can occur during mathematical operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    /// Matrix dimensions are incompatible.
    #[error("Incompatible matrix dimensions: ({rows1}x{cols1}) and ({rows2}x{cols2})")]
    DimensionMismatch {
        /// Rows in first matrix.
        rows1: usize,
        /// Columns in first matrix.
        cols1: usize,
        /// Rows in second matrix.
        rows2: usize,
        /// Columns in second matrix.
        cols2: usize,
    },

    /// Insufficient data points for operation.
    #[error("Insufficient data: need at least {required}, got {actual}")]
    InsufficientData {
        /// Minimum required points.
        required: usize,
        /// Actual number of points.
        actual: usize,
    },

    /// Invalid input parameter.
    #[error("Invalid input: {reason}")]
    InvalidInput {
        /// Description of the invalid input.
        reason: String,
    },

    /// The constraint set admits no solution.
    #[error("Problem is infeasible: {reason}")]
    Infeasible {
        /// Which constraints conflict, as far as known.
        reason: String,
    },

    /// The solver hit its deadline before converging.
    #[error("Solver exceeded time limit of {limit:?}")]
    Timeout {
        /// The configured deadline.
        limit: Duration,
    },

    /// The solver stopped at its iteration cap.
    #[error("Convergence failed after {iterations} iterations")]
    ConvergenceFailed {
        /// Number of iterations attempted.
        iterations: u32,
    },

    /// Numerical breakdown: indefinite quadratic form, NaNs, or a solver
    /// that could not make progress.
    #[error("Numerical instability: {reason}")]
    NumericalInstability {
        /// What went wrong.
        reason: String,
    },

    /// The solver backend rejected the problem or its settings.
    #[error("Solver failure: {reason}")]
    SolverFailed {
        /// Backend-provided description.
        reason: String,
    },
}

impl MathError {
    /// Creates an invalid input error.
    #[must_use]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Creates an insufficient data error.
    #[must_use]
    pub fn insufficient_data(required: usize, actual: usize) -> Self {
        Self::InsufficientData { required, actual }
    }

    /// Creates an infeasibility error.
    #[must_use]
    pub fn infeasible(reason: impl Into<String>) -> Self {
        Self::Infeasible {
            reason: reason.into(),
        }
    }

    /// Creates a numerical instability error.
    #[must_use]
    pub fn numerical(reason: impl Into<String>) -> Self {
        Self::NumericalInstability {
            reason: reason.into(),
        }
    }

    /// Creates a solver failure error.
    #[must_use]
    pub fn solver_failed(reason: impl Into<String>) -> Self {
        Self::SolverFailed {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MathError::insufficient_data(2, 1);
        assert!(err.to_string().contains("need at least 2"));

        let err = MathError::Timeout {
            limit: Duration::from_millis(250),
        };
        assert!(err.to_string().contains("250ms"));

        let err = MathError::infeasible("cash floor exceeds bound");
        assert!(err.to_string().starts_with("Problem is infeasible"));
    }
}
