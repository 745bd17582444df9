//! Configuration types.

mod config;

pub use config::{GapPolicy, OptimizerConfig, ReturnsConfig, SimulationConfig};
