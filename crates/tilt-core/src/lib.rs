//! # Tilt Core
//!
//! Core types and abstractions for the Tilt portfolio analytics library.
//!
//! This crate provides the building blocks shared by every other Tilt crate:
//!
//! - **Types**: `Date`, `SecurityId`, price/dividend observations, total-return
//!   series and weight vectors
//! - **Traits**: the [`PriceHistorySource`](traits::PriceHistorySource) seam through
//!   which surrounding I/O code hands price histories to the analytics
//!
//! ## Design Philosophy
//!
//! - **Type Safety**: Newtypes prevent mixing identifiers, dates and raw strings
//! - **Plain Values**: Everything here is an immutable, serializable value type
//! - **Explicit Over Implicit**: No process-wide state; callers pass everything in
//!
//! ## Example
//!
//! ```rust
//! use tilt_core::prelude::*;
//!
//! let weights = WeightVector::from_pairs([
//!     (SecurityId::new("TD CN"), 0.6),
//!     (SecurityId::new("RY CN"), 0.4),
//! ]);
//! assert!((weights.total() - 1.0).abs() < 1e-12);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::similar_names)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::trivially_copy_pass_by_ref)]

pub mod error;
pub mod traits;
pub mod types;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::traits::{InMemoryPriceSource, PriceHistorySource};
    pub use crate::types::{
        Date, DateRange, DividendSchedule, PriceHistory, PriceObservation, SecurityId,
        TotalReturnPoint, TotalReturnSeries, WeightVector,
    };
}

// Re-export commonly used types at crate root
pub use error::{CoreError, CoreResult};
pub use types::{Date, DateRange, SecurityId, WeightVector};
