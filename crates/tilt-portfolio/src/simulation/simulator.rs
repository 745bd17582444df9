//! Multi-period weight-drift compounding.
//!
//! Between consecutive boundary dates each security compounds its daily
//! returns, weights drift with performance and are renormalized, and the
//! drifted weights carry into the next period unless a
//! [`RebalancePolicy`] overrides them.

use tilt_core::types::{Date, SecurityId, WeightVector};
use tracing::{debug, warn};

use super::attribution::PeriodAttribution;
use crate::error::{PortfolioError, PortfolioResult};
use crate::returns::ReturnsMatrix;
use crate::types::{GapPolicy, SimulationConfig};

/// Decides whether to replace the drifted weights at a boundary.
pub trait RebalancePolicy {
    /// Called at every interior boundary.
    ///
    /// `history` holds only the matrix rows strictly before `boundary`.
    /// Returning `Some` replaces `drifted` as the next period's start weights.
    fn rebalance(
        &mut self,
        boundary: Date,
        history: &ReturnsMatrix,
        drifted: &WeightVector,
    ) -> PortfolioResult<Option<WeightVector>>;
}

/// Never rebalances; weights drift freely.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRebalance;

impl RebalancePolicy for NoRebalance {
    fn rebalance(
        &mut self,
        _boundary: Date,
        _history: &ReturnsMatrix,
        _drifted: &WeightVector,
    ) -> PortfolioResult<Option<WeightVector>> {
        Ok(None)
    }
}

impl<F> RebalancePolicy for F
where
    F: FnMut(Date, &ReturnsMatrix, &WeightVector) -> PortfolioResult<Option<WeightVector>>,
{
    fn rebalance(
        &mut self,
        boundary: Date,
        history: &ReturnsMatrix,
        drifted: &WeightVector,
    ) -> PortfolioResult<Option<WeightVector>> {
        self(boundary, history, drifted)
    }
}

/// Compounds returns across boundary dates with weight drift.
#[derive(Debug, Clone, Default)]
pub struct CompoundingSimulator {
    config: SimulationConfig,
}

impl CompoundingSimulator {
    /// Creates a simulator.
    #[must_use]
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    /// The simulator configuration.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Simulates buy-and-hold drift across `boundary_dates`.
    ///
    /// # Errors
    ///
    /// See [`simulate_with`](Self::simulate_with).
    pub fn simulate(
        &self,
        boundary_dates: &[Date],
        initial_weights: &WeightVector,
        returns: &ReturnsMatrix,
    ) -> PortfolioResult<Vec<PeriodAttribution>> {
        self.simulate_with(boundary_dates, initial_weights, returns, &mut NoRebalance)
    }

    /// Simulates across `boundary_dates`, consulting `policy` at each
    /// interior boundary.
    ///
    /// Returns one row per security per period, in weight order.
    ///
    /// # Errors
    ///
    /// - `Validation`: fewer than two distinct boundaries, or initial or
    ///   override weights that do not sum to one
    /// - `DataGap`: missing data under [`GapPolicy::Fail`]
    /// - `NumericalInstability`: drifted weights cannot be normalized
    pub fn simulate_with<P: RebalancePolicy + ?Sized>(
        &self,
        boundary_dates: &[Date],
        initial_weights: &WeightVector,
        returns: &ReturnsMatrix,
        policy: &mut P,
    ) -> PortfolioResult<Vec<PeriodAttribution>> {
        let mut boundaries = boundary_dates.to_vec();
        boundaries.sort_unstable();
        boundaries.dedup();
        if boundaries.len() < 2 {
            return Err(PortfolioError::validation(
                "boundary dates",
                format!("need at least two distinct dates, got {}", boundaries.len()),
            ));
        }

        self.validate_weights("initial weights", initial_weights)?;

        let mut rows = Vec::with_capacity(initial_weights.len() * (boundaries.len() - 1));
        let mut weights = initial_weights.clone();

        for (k, pair) in boundaries.windows(2).enumerate() {
            let (start, end) = (pair[0], pair[1]);

            if k > 0 {
                let history = returns.before(start);
                if let Some(target) = policy.rebalance(start, &history, &weights)? {
                    self.validate_weights(&format!("rebalance weights on {start}"), &target)?;
                    debug!(boundary = %start, "applying rebalance override");
                    weights = target;
                }
            }

            let period = self.simulate_period(start, end, &weights, returns)?;
            weights = period
                .iter()
                .map(|r| (r.security.clone(), r.end_wt))
                .collect();
            rows.extend(period);
        }

        debug!(
            periods = boundaries.len() - 1,
            rows = rows.len(),
            "simulation complete"
        );
        Ok(rows)
    }

    fn validate_weights(&self, what: &str, weights: &WeightVector) -> PortfolioResult<()> {
        if weights.is_empty() {
            return Err(PortfolioError::validation(what, "no weights given"));
        }
        if let Some((id, w)) = weights.first_non_finite() {
            return Err(PortfolioError::validation(
                what,
                format!("non-finite weight {w} for '{id}'"),
            ));
        }
        if !weights.is_fully_invested(self.config.weight_tolerance) {
            return Err(PortfolioError::validation(
                what,
                format!("weights sum to {}, expected 1", weights.total()),
            ));
        }
        Ok(())
    }

    fn simulate_period(
        &self,
        start: Date,
        end: Date,
        weights: &WeightVector,
        returns: &ReturnsMatrix,
    ) -> PortfolioResult<Vec<PeriodAttribution>> {
        let window = returns.window(start, end);
        let outside = match (returns.first_date(), returns.last_date()) {
            (Some(first), Some(last)) => end < first || start >= last,
            _ => true,
        };

        let mut period_returns = Vec::with_capacity(weights.len());
        for (id, _) in weights.iter() {
            let r = match window.column(id) {
                Some(col) if !outside => Some(compound(col)),
                _ => self.gap(id, start, end)?,
            };
            period_returns.push(r);
        }

        let total: f64 = weights
            .iter()
            .zip(&period_returns)
            .filter_map(|((_, w), r)| r.map(|r| w * (1.0 + r)))
            .sum();
        if !total.is_finite() || total <= 0.0 {
            return Err(PortfolioError::numerical(format!(
                "drifted weights for ({start}, {end}] sum to {total}"
            )));
        }

        Ok(weights
            .iter()
            .zip(period_returns)
            .map(|((id, w), r)| PeriodAttribution {
                security: id.clone(),
                start_date: start,
                end_date: end,
                start_wt: w,
                period_return: r,
                end_wt: r.map_or(0.0, |r| w * (1.0 + r) / total),
            })
            .collect())
    }

    fn gap(&self, id: &SecurityId, start: Date, end: Date) -> PortfolioResult<Option<f64>> {
        match self.config.gap_policy {
            GapPolicy::Fail => Err(PortfolioError::data_gap_window(id.as_str(), start, end)),
            GapPolicy::Exclude => {
                warn!(security = %id, %start, %end, "excluding security with no returns");
                Ok(None)
            }
        }
    }
}

/// `Π(1 + r) - 1`; zero for an empty window.
fn compound(returns: &[f64]) -> f64 {
    returns.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{cumulative_return, portfolio_period_returns};
    use approx::assert_relative_eq;

    fn d(s: &str) -> Date {
        Date::parse(s).unwrap()
    }

    fn ab_matrix() -> ReturnsMatrix {
        ReturnsMatrix::new(
            vec![d("2024-01-02"), d("2024-01-03")],
            vec![SecurityId::new("A"), SecurityId::new("B")],
            vec![vec![0.01, -0.01], vec![0.0, 0.02]],
        )
        .unwrap()
    }

    fn half_half() -> WeightVector {
        WeightVector::from_pairs([(SecurityId::new("A"), 0.5), (SecurityId::new("B"), 0.5)])
    }

    #[test]
    fn test_two_security_drift() {
        let sim = CompoundingSimulator::default();
        let rows = sim
            .simulate(&[d("2024-01-01"), d("2024-01-03")], &half_half(), &ab_matrix())
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_relative_eq!(rows[0].period_return.unwrap(), -0.0001, epsilon = 1e-12);
        assert_relative_eq!(rows[1].period_return.unwrap(), 0.02, epsilon = 1e-12);

        let total = 0.5 * 0.9999 + 0.5 * 1.02;
        assert_relative_eq!(rows[0].end_wt, 0.5 * 0.9999 / total, epsilon = 1e-12);
        assert_relative_eq!(rows[1].end_wt, 0.5 * 1.02 / total, epsilon = 1e-12);
        assert_relative_eq!(rows[0].end_wt, 0.4950, epsilon = 1e-4);
        assert_relative_eq!(rows[1].end_wt, 0.5050, epsilon = 1e-4);
        assert_relative_eq!(rows[0].end_wt + rows[1].end_wt, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_chaining_law() {
        let sim = CompoundingSimulator::default();
        let m = ab_matrix();
        let w = half_half();

        let one = sim.simulate(&[d("2024-01-01"), d("2024-01-03")], &w, &m).unwrap();
        let two = sim
            .simulate(&[d("2024-01-01"), d("2024-01-02"), d("2024-01-03")], &w, &m)
            .unwrap();

        let r_one = cumulative_return(&portfolio_period_returns(&one));
        let r_two = cumulative_return(&portfolio_period_returns(&two));
        assert_relative_eq!(r_one, r_two, epsilon = 1e-12);
    }

    #[test]
    fn test_boundaries_sorted_and_deduped() {
        let sim = CompoundingSimulator::default();
        let rows = sim
            .simulate(
                &[d("2024-01-03"), d("2024-01-01"), d("2024-01-03")],
                &half_half(),
                &ab_matrix(),
            )
            .unwrap();
        assert_eq!(rows.len(), 2);

        let err = sim
            .simulate(&[d("2024-01-03"), d("2024-01-03")], &half_half(), &ab_matrix())
            .unwrap_err();
        assert!(matches!(err, PortfolioError::Validation { .. }));
    }

    #[test]
    fn test_holiday_window_is_zero_return() {
        let m = ReturnsMatrix::new(
            vec![d("2024-01-02"), d("2024-01-08")],
            vec![SecurityId::new("A")],
            vec![vec![0.01, 0.02]],
        )
        .unwrap();
        let w = WeightVector::from_pairs([(SecurityId::new("A"), 1.0)]);
        let rows = CompoundingSimulator::default()
            .simulate(&[d("2024-01-03"), d("2024-01-05")], &w, &m)
            .unwrap();
        assert_eq!(rows[0].period_return, Some(0.0));
    }

    #[test]
    fn test_gap_policies() {
        let w = WeightVector::from_pairs([
            (SecurityId::new("A"), 0.5),
            (SecurityId::new("Z"), 0.3),
            (SecurityId::cash(), 0.2),
        ]);
        let bounds = [d("2024-01-01"), d("2024-01-03")];

        let err = CompoundingSimulator::default()
            .simulate(&bounds, &w, &ab_matrix())
            .unwrap_err();
        assert!(matches!(err, PortfolioError::DataGap { ref security, .. } if security == "Z"));

        let exclude = SimulationConfig::new().with_gap_policy(GapPolicy::Exclude);
        let sim = CompoundingSimulator::new(exclude);
        let rows = sim.simulate(&bounds, &w, &ab_matrix()).unwrap();
        assert_eq!(rows[1].period_return, None);
        assert_relative_eq!(rows[1].end_wt, 0.0);
        assert_eq!(rows[2].period_return, Some(0.0));
        let end_total: f64 = rows.iter().map(|r| r.end_wt).sum();
        assert_relative_eq!(end_total, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_window_outside_matrix_is_gap() {
        let err = CompoundingSimulator::default()
            .simulate(&[d("2024-02-01"), d("2024-02-05")], &half_half(), &ab_matrix())
            .unwrap_err();
        assert!(matches!(err, PortfolioError::DataGap { .. }));
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let w = WeightVector::from_pairs([(SecurityId::new("A"), 0.5)]);
        let err = CompoundingSimulator::default()
            .simulate(&[d("2024-01-01"), d("2024-01-03")], &w, &ab_matrix())
            .unwrap_err();
        assert!(matches!(err, PortfolioError::Validation { .. }));
    }

    #[test]
    fn test_policy_sees_only_past_rows() {
        let bounds = [d("2024-01-01"), d("2024-01-02"), d("2024-01-03")];
        let mut seen = Vec::new();
        let mut policy = |boundary: Date,
                          history: &ReturnsMatrix,
                          _: &WeightVector|
         -> PortfolioResult<Option<WeightVector>> {
            assert!(history.dates().iter().all(|x| *x < boundary));
            seen.push((boundary, history.len()));
            Ok(Some(half_half()))
        };
        let rows = CompoundingSimulator::default()
            .simulate_with(&bounds, &half_half(), &ab_matrix(), &mut policy)
            .unwrap();

        assert_eq!(seen, vec![(d("2024-01-02"), 0)]);
        // Second period restarts from the override.
        assert_relative_eq!(rows[2].start_wt, 0.5);
        assert_relative_eq!(rows[3].start_wt, 0.5);
    }

    #[test]
    fn test_bad_override_rejected() {
        let bounds = [d("2024-01-01"), d("2024-01-02"), d("2024-01-03")];
        let mut policy = |_: Date,
                          _: &ReturnsMatrix,
                          _: &WeightVector|
         -> PortfolioResult<Option<WeightVector>> {
            Ok(Some(WeightVector::from_pairs([(SecurityId::new("A"), 2.0)])))
        };
        let err = CompoundingSimulator::default()
            .simulate_with(&bounds, &half_half(), &ab_matrix(), &mut policy)
            .unwrap_err();
        assert!(matches!(err, PortfolioError::Validation { .. }));
    }
}
