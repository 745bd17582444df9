//! Benchmarks for returns assembly, optimization and simulation.
//!
//! Run with: cargo bench -p tilt-portfolio

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use tilt_core::prelude::*;
use tilt_portfolio::{
    boundary_dates, BoundaryFrequency, CompoundingSimulator, ReturnsMatrix,
    ReturnsMatrixAssembler, TrackingErrorOptimizer,
};

// =============================================================================
// FIXTURES
// =============================================================================

fn trading_days(n: usize) -> Vec<Date> {
    let mut out = Vec::with_capacity(n);
    let mut date = Date::from_ymd(2015, 1, 2).unwrap();
    while out.len() < n {
        if !date.is_weekend() {
            out.push(date);
        }
        date = date.add_days(1);
    }
    out
}

fn create_source(securities: usize, days: usize) -> (InMemoryPriceSource, Vec<SecurityId>) {
    let dates = trading_days(days);
    let mut source = InMemoryPriceSource::new();
    let mut ids = Vec::with_capacity(securities);

    for s in 0..securities {
        let id = SecurityId::new(format!("SEC{s:03} CN"));
        let mut price = 50.0 + s as f64;
        let observations = dates
            .iter()
            .enumerate()
            .map(|(i, date)| {
                let step = ((i * 7 + s * 13) % 21) as f64 - 10.0;
                price *= 1.0 + step / 1000.0;
                if i > 0 && i % 63 == 0 {
                    PriceObservation::with_dividend(*date, price, 0.25)
                } else {
                    PriceObservation::new(*date, price)
                }
            })
            .collect();
        source = source.with_history(PriceHistory::new(id.clone(), observations).unwrap());
        ids.push(id);
    }
    (source, ids)
}

fn create_matrix(securities: usize, days: usize) -> ReturnsMatrix {
    let (source, ids) = create_source(securities, days);
    ReturnsMatrixAssembler::new(source)
        .assemble(&ids, &DateRange::unbounded())
        .unwrap()
}

fn equal_weights(matrix: &ReturnsMatrix) -> WeightVector {
    let ids: Vec<SecurityId> = matrix
        .columns()
        .iter()
        .filter(|id| !id.is_cash())
        .cloned()
        .collect();
    WeightVector::equal_weight_with_cash(&ids, 0.0)
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_assemble(c: &mut Criterion) {
    let mut group = c.benchmark_group("assemble");
    group.sample_size(20);

    for securities in [5, 20, 50].iter() {
        let (source, ids) = create_source(*securities, 1260);
        let assembler = ReturnsMatrixAssembler::new(source);

        group.throughput(Throughput::Elements(*securities as u64));
        group.bench_with_input(BenchmarkId::from_parameter(securities), &ids, |b, ids| {
            b.iter(|| assembler.assemble(black_box(ids), &DateRange::unbounded()))
        });
    }
    group.finish();
}

fn bench_optimize(c: &mut Criterion) {
    let optimizer = TrackingErrorOptimizer::default();

    let mut group = c.benchmark_group("optimize");
    group.sample_size(20);

    for securities in [5, 20, 50].iter() {
        let matrix = create_matrix(*securities, 252);
        let benchmark = equal_weights(&matrix);

        group.bench_with_input(
            BenchmarkId::from_parameter(securities),
            &(matrix, benchmark),
            |b, (matrix, benchmark)| {
                b.iter(|| optimizer.minimize_active_risk(black_box(benchmark), 0.0005, matrix))
            },
        );
    }
    group.finish();
}

fn bench_simulate(c: &mut Criterion) {
    let simulator = CompoundingSimulator::default();
    let matrix = create_matrix(20, 1260);
    let weights = equal_weights(&matrix);

    let mut group = c.benchmark_group("simulate");
    for frequency in [BoundaryFrequency::Daily, BoundaryFrequency::Monthly] {
        let bounds = boundary_dates(matrix.dates(), frequency);
        group.throughput(Throughput::Elements(bounds.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(frequency),
            &bounds,
            |b, bounds| b.iter(|| simulator.simulate(black_box(bounds), &weights, &matrix)),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_assemble, bench_optimize, bench_simulate);
criterion_main!(benches);
