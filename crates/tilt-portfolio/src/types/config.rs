//! Configuration for return building, optimization and simulation.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tilt_math::optimization::QpSettings;

/// Configuration for building total-return series and returns matrices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReturnsConfig {
    /// Enable parallel processing (requires 'parallel' feature).
    pub parallel: bool,

    /// Minimum security count to trigger parallel processing.
    /// Below this threshold, sequential is faster due to thread overhead.
    pub parallel_threshold: usize,
}

impl Default for ReturnsConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            parallel_threshold: 16,
        }
    }
}

impl ReturnsConfig {
    /// Creates a new config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a config that always uses sequential processing.
    #[must_use]
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    /// Sets whether to use parallel processing.
    #[must_use]
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// Sets the threshold for parallel processing.
    #[must_use]
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Returns true if parallel processing should be used for the given count.
    #[must_use]
    pub fn should_parallelize(&self, count: usize) -> bool {
        cfg!(feature = "parallel") && self.parallel && count >= self.parallel_threshold
    }
}

/// Configuration for the tracking-error optimizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Maximum absolute active weight per security.
    pub bound: f64,

    /// Multiplier applied to the covariance before solving. Daily return
    /// covariances are ~1e-4, which sits below typical solver tolerances.
    pub objective_scale: f64,

    /// Solver deadline in seconds; `None` means unlimited.
    pub time_limit_secs: Option<f64>,

    /// Maximum solver iterations.
    pub max_iterations: u32,

    /// Solver feasibility and gap tolerance.
    pub solver_tolerance: f64,

    /// Tolerance for weight sums and constraint checks on the result.
    pub weight_tolerance: f64,

    /// Relative eigenvalue tolerance for the covariance PSD check.
    pub psd_tolerance: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            bound: 0.10,
            objective_scale: 1e9,
            time_limit_secs: Some(30.0),
            max_iterations: 200,
            solver_tolerance: 1e-9,
            weight_tolerance: 1e-6,
            psd_tolerance: 1e-10,
        }
    }
}

impl OptimizerConfig {
    /// Creates a new config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-security active-weight bound.
    #[must_use]
    pub fn with_bound(mut self, bound: f64) -> Self {
        self.bound = bound;
        self
    }

    /// Sets the objective scale.
    #[must_use]
    pub fn with_objective_scale(mut self, scale: f64) -> Self {
        self.objective_scale = scale;
        self
    }

    /// Sets the solver deadline.
    #[must_use]
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit_secs = Some(limit.as_secs_f64());
        self
    }

    /// Removes the solver deadline.
    #[must_use]
    pub fn without_time_limit(mut self) -> Self {
        self.time_limit_secs = None;
        self
    }

    /// Sets the result tolerance.
    #[must_use]
    pub fn with_weight_tolerance(mut self, tolerance: f64) -> Self {
        self.weight_tolerance = tolerance;
        self
    }

    /// The solver deadline as a [`Duration`].
    #[must_use]
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_secs
            .filter(|s| s.is_finite() && *s >= 0.0)
            .map(Duration::from_secs_f64)
    }

    /// Solver settings derived from this config.
    #[must_use]
    pub fn qp_settings(&self) -> QpSettings {
        let settings = QpSettings::default()
            .with_max_iterations(self.max_iterations)
            .with_tolerance(self.solver_tolerance);
        match self.time_limit() {
            Some(limit) => settings.with_time_limit(limit),
            None => settings,
        }
    }
}

/// How the simulator treats a security with no return data for a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GapPolicy {
    /// Abort the simulation with a data-gap error.
    #[default]
    Fail,
    /// Keep the row with no return and zero end weight.
    Exclude,
}

/// Configuration for the compounding simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Treatment of data gaps.
    pub gap_policy: GapPolicy,

    /// Tolerance for initial and override weights summing to one.
    pub weight_tolerance: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            gap_policy: GapPolicy::Fail,
            weight_tolerance: 1e-6,
        }
    }
}

impl SimulationConfig {
    /// Creates a new config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the gap policy.
    #[must_use]
    pub fn with_gap_policy(mut self, policy: GapPolicy) -> Self {
        self.gap_policy = policy;
        self
    }

    /// Sets the weight tolerance.
    #[must_use]
    pub fn with_weight_tolerance(mut self, tolerance: f64) -> Self {
        self.weight_tolerance = tolerance;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let returns = ReturnsConfig::default();
        assert!(returns.parallel);
        assert_eq!(returns.parallel_threshold, 16);

        let opt = OptimizerConfig::default();
        assert!((opt.bound - 0.10).abs() < f64::EPSILON);
        assert!((opt.objective_scale - 1e9).abs() < f64::EPSILON);
        assert_eq!(opt.time_limit(), Some(Duration::from_secs(30)));

        let sim = SimulationConfig::default();
        assert_eq!(sim.gap_policy, GapPolicy::Fail);
    }

    #[test]
    fn test_builder_pattern() {
        let opt = OptimizerConfig::new()
            .with_bound(0.03)
            .with_time_limit(Duration::from_millis(500))
            .with_weight_tolerance(1e-8);
        assert!((opt.bound - 0.03).abs() < f64::EPSILON);
        assert_eq!(opt.qp_settings().time_limit, Some(Duration::from_millis(500)));
        assert_eq!(opt.without_time_limit().qp_settings().time_limit, None);

        let sim = SimulationConfig::new().with_gap_policy(GapPolicy::Exclude);
        assert_eq!(sim.gap_policy, GapPolicy::Exclude);
    }

    #[test]
    fn test_should_parallelize() {
        let config = ReturnsConfig::new().with_threshold(10);

        #[cfg(feature = "parallel")]
        {
            assert!(!config.should_parallelize(5));
            assert!(config.should_parallelize(10));
        }

        #[cfg(not(feature = "parallel"))]
        {
            assert!(!config.should_parallelize(5));
            assert!(!config.should_parallelize(10));
        }

        assert!(!ReturnsConfig::sequential().should_parallelize(1000));
    }

    #[test]
    fn test_serde_partial() {
        let opt: OptimizerConfig = serde_json::from_str(r#"{"bound": 0.05}"#).unwrap();
        assert!((opt.bound - 0.05).abs() < f64::EPSILON);
        assert!((opt.objective_scale - 1e9).abs() < f64::EPSILON);

        let sim: SimulationConfig = serde_json::from_str(r#"{"gap_policy": "exclude"}"#).unwrap();
        assert_eq!(sim.gap_policy, GapPolicy::Exclude);
    }
}
