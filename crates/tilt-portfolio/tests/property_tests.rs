//! Property-based tests for return and drift invariants.
//!
//! These tests verify key properties that should always hold:
//! - Drifted end weights sum to one in every period
//! - A dividend-free series is its own total-return series
//! - Splitting a buy-and-hold period does not change the compounded return
//! - Assembling the same inputs twice gives the same matrix
//! - Optimized active weights net to zero, fund the cash floor and stay
//!   inside their bounds

use proptest::prelude::*;
use tilt_core::prelude::{
    Date, DateRange, DividendSchedule, InMemoryPriceSource, PriceHistory, PriceHistorySource,
    PriceObservation, SecurityId, TotalReturnSeries, WeightVector,
};
use tilt_portfolio::{
    assemble_from_series, build_total_return, cumulative_return, portfolio_period_returns,
    CompoundingSimulator, OptimizerConfig, ReturnsMatrix, ReturnsMatrixAssembler,
    TrackingErrorOptimizer,
};

// =============================================================================
// STRATEGIES
// =============================================================================

fn dates(n: usize) -> Vec<Date> {
    let start = Date::from_ymd(2023, 1, 2).unwrap();
    (0..n as i64).map(|i| start.add_days(i)).collect()
}

fn ids(k: usize) -> Vec<SecurityId> {
    (0..k).map(|i| SecurityId::new(format!("S{i}"))).collect()
}

/// `k` columns of `n` daily returns in (-5%, +5%).
fn returns_grid(k: usize, n: usize) -> impl Strategy<Value = Vec<Vec<f64>>> {
    prop::collection::vec(prop::collection::vec(-0.05f64..0.05, n), k)
}

/// Positive raw weights that are normalized to sum to one.
fn weights(k: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.01f64..1.0, k).prop_map(|raw| {
        let total: f64 = raw.iter().sum();
        raw.into_iter().map(|w| w / total).collect()
    })
}

fn weight_vector(ids: &[SecurityId], w: &[f64]) -> WeightVector {
    ids.iter().cloned().zip(w.iter().copied()).collect()
}

/// A benchmark over `k` securities that may hold some cash, a bound, and a
/// floor whose required cash tilt stays inside the feasible region.
fn feasible_problem(k: usize) -> impl Strategy<Value = (WeightVector, f64, f64)> {
    (weights(k), prop_oneof![Just(0.0), 0.0f64..0.2], 0.01f64..0.2, -1.0f64..0.95).prop_map(
        move |(w, bench_cash, bound, u)| {
            let mut benchmark: WeightVector = ids(k)
                .into_iter()
                .zip(w.into_iter().map(|x| x * (1.0 - bench_cash)))
                .collect();
            if bench_cash > 0.0 {
                benchmark.insert(SecurityId::cash(), bench_cash);
            }
            let floor = (bench_cash + u * bound).max(0.0);
            (benchmark, bound, floor)
        },
    )
}

fn closes(n: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0f64..500.0, n)
}

// =============================================================================
// PROPERTIES
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_end_weights_sum_to_one(
        (grid, w) in (2usize..6).prop_flat_map(|k| (returns_grid(k, 12), weights(k))),
        cut in 1usize..11,
    ) {
        let k = grid.len();
        let axis = dates(12);
        let matrix = ReturnsMatrix::new(axis.clone(), ids(k), grid).unwrap();
        let initial = weight_vector(&ids(k), &w);

        let bounds = [axis[0].add_days(-1), axis[cut], axis[11]];
        let rows = CompoundingSimulator::default()
            .simulate(&bounds, &initial, &matrix)
            .unwrap();

        for period in rows.chunks(k) {
            let total: f64 = period.iter().map(|r| r.end_wt).sum();
            prop_assert!((total - 1.0).abs() <= 1e-9);
        }
    }

    #[test]
    fn prop_zero_dividends_is_identity(prices in closes(20)) {
        let axis = dates(20);
        let obs: Vec<PriceObservation> = axis
            .iter()
            .zip(&prices)
            .map(|(d, p)| PriceObservation::new(*d, *p))
            .collect();
        let series = build_total_return(
            &SecurityId::new("X"),
            &obs,
            &DividendSchedule::new(),
        )
        .unwrap();

        for (point, price) in series.points().iter().zip(&prices) {
            prop_assert_eq!(point.total_return_price, *price);
        }
    }

    #[test]
    fn prop_chaining_law(
        (grid, w) in (2usize..5).prop_flat_map(|k| (returns_grid(k, 10), weights(k))),
        cut in 1usize..9,
    ) {
        let k = grid.len();
        let axis = dates(10);
        let matrix = ReturnsMatrix::new(axis.clone(), ids(k), grid).unwrap();
        let initial = weight_vector(&ids(k), &w);
        let sim = CompoundingSimulator::default();
        let d0 = axis[0].add_days(-1);

        let whole = sim.simulate(&[d0, axis[9]], &initial, &matrix).unwrap();
        let split = sim.simulate(&[d0, axis[cut], axis[9]], &initial, &matrix).unwrap();

        let r_whole = cumulative_return(&portfolio_period_returns(&whole));
        let r_split = cumulative_return(&portfolio_period_returns(&split));
        prop_assert!((r_whole - r_split).abs() <= 1e-12);
    }

    #[test]
    fn prop_assembly_is_idempotent(
        a in closes(15),
        b in closes(11),
        offset in 0i64..4,
    ) {
        let axis = dates(15);
        let a_hist = PriceHistory::from_closes(
            SecurityId::new("A"),
            axis.iter().copied().zip(a),
            &DividendSchedule::new(),
        )
        .unwrap();
        let b_hist = PriceHistory::from_closes(
            SecurityId::new("B"),
            axis.iter().map(|d| d.add_days(offset)).zip(b),
            &DividendSchedule::new(),
        )
        .unwrap();
        let source = InMemoryPriceSource::new().with_history(a_hist).with_history(b_hist);
        let assembler = ReturnsMatrixAssembler::new(source);
        let request = [SecurityId::new("B"), SecurityId::cash(), SecurityId::new("A")];

        let first = assembler.assemble(&request, &DateRange::unbounded()).unwrap();
        let second = assembler.assemble(&request, &DateRange::unbounded()).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.columns().last(), Some(&SecurityId::cash()));

        // Same result when the series are built by hand.
        let series: Vec<TotalReturnSeries> = ["B", "A"]
            .iter()
            .map(|id| {
                let h = assembler
                    .source()
                    .price_history(&SecurityId::new(*id), &DateRange::unbounded())
                    .unwrap();
                build_total_return(&h.security, &h.observations, &DividendSchedule::new()).unwrap()
            })
            .collect();
        let direct = assemble_from_series(&series, &DateRange::unbounded()).unwrap();
        prop_assert_eq!(&first, &direct);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_optimized_weights_respect_constraints(
        (grid, (benchmark, bound, floor)) in (1usize..5)
            .prop_flat_map(|k| (returns_grid(k, 30), feasible_problem(k))),
    ) {
        let k = grid.len();
        let matrix = ReturnsMatrix::new(dates(30), ids(k), grid).unwrap();
        let optimizer = TrackingErrorOptimizer::new(OptimizerConfig::default().with_bound(bound));
        let tol = 1e-6;

        let sol = optimizer.solve(&benchmark, floor, &matrix).unwrap();
        let x = &sol.active_weights;

        prop_assert!(x.total().abs() <= tol, "active weights sum to {}", x.total());
        prop_assert!(
            x.cash_weight() >= floor - benchmark.cash_weight() - tol,
            "cash tilt {} below {}",
            x.cash_weight(),
            floor - benchmark.cash_weight()
        );
        for (id, xi) in x.iter() {
            prop_assert!(xi.abs() <= bound + tol, "{} active {} outside bound {}", id, xi, bound);
        }
        prop_assert!((sol.portfolio_weights.total() - 1.0).abs() <= tol);
    }
}
