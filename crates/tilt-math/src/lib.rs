//! # Tilt Math
//!
//! Mathematical utilities for the Tilt portfolio analytics library.
//!
//! This crate provides:
//!
//! - **Linear Algebra**: Sample covariance, quadratic forms, and positive
//!   semi-definiteness checks
//! - **Optimization**: A backend-agnostic quadratic-program description
//!   ([`QuadraticProgram`](optimization::QuadraticProgram)), the
//!   [`QpSolver`](optimization::QpSolver) seam, and a Clarabel implementation
//!
//! ## Design Philosophy
//!
//! - **Delegate the solver**: Problems are formulated here and solved by an
//!   existing interior-point QP solver
//! - **Numerical Stability**: Solver statuses map onto distinct error kinds
//!   (infeasible, timeout, numerical trouble)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::similar_names)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::unreadable_literal)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::uninlined_format_args)]

pub mod error;
pub mod linear_algebra;
pub mod optimization;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{MathError, MathResult};
    pub use crate::linear_algebra::{
        is_positive_semidefinite, min_eigenvalue, quadratic_form, sample_covariance,
    };
    pub use crate::optimization::{
        ClarabelSolver, ConstraintSense, QpSettings, QpSolution, QpSolver, QpStatus,
        QuadraticProgram,
    };
}

pub use error::{MathError, MathResult};
