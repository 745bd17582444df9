//! Tracking-error optimization and active-weight reporting.
//!
//! - [`TrackingErrorOptimizer`]: minimize ex-ante active variance under a
//!   cash-drag floor, solved through a [`QpSolver`](tilt_math::optimization::QpSolver)
//! - [`active_weights`], [`ex_ante_tracking_error_bps`], [`naive_cash_drag_tilt`]:
//!   reporting helpers

mod active;
mod tracking;

pub use active::{
    active_weights, ex_ante_tracking_error_bps, naive_cash_drag_tilt, ActiveWeight, ActiveWeights,
};
pub use tracking::{minimize_active_risk, ActiveRiskSolution, TrackingErrorOptimizer};
