//! Optimize command implementation.
//!
//! Solves for the weights closest in active risk to the configured benchmark
//! while holding at least the cash-drag floor in cash, and compares the
//! result with naively scaling the benchmark down.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use tilt_core::types::{SecurityId, WeightVector};
use tilt_portfolio::{
    active_weights, ex_ante_tracking_error_bps, naive_cash_drag_tilt, ActiveRiskSolution,
    ReturnsMatrix, TrackingErrorOptimizer,
};
use tracing::info;

use crate::cli::OutputFormat;
use crate::commands::validate_fraction;
use crate::config::BacktestConfig;
use crate::output::{format_weight, print_header, print_json, print_output, KeyValue};

/// Arguments for the optimize command.
#[derive(Args, Debug)]
pub struct OptimizeArgs {
    /// Backtest configuration file (TOML)
    #[arg(short, long)]
    pub config: PathBuf,

    /// Cash-drag floor override (fraction, e.g. 0.0005)
    #[arg(long)]
    pub floor: Option<f64>,

    /// Active-weight bound override (fraction, e.g. 0.03)
    #[arg(long)]
    pub bound: Option<f64>,
}

/// One security's weights in the optimized portfolio.
#[derive(Debug, Serialize, Tabled)]
pub struct WeightRow {
    #[tabled(rename = "Security")]
    pub security: String,
    #[tabled(rename = "Benchmark", display_with = "display_weight")]
    pub benchmark: f64,
    #[tabled(rename = "Naive", display_with = "display_weight")]
    pub naive: f64,
    #[tabled(rename = "Optimized", display_with = "display_weight")]
    pub optimized: f64,
    #[tabled(rename = "Active", display_with = "display_weight")]
    pub active: f64,
}

fn display_weight(value: &f64) -> String {
    format_weight(*value)
}

#[derive(Debug, Serialize)]
struct OptimizeReport<'a> {
    cash_drag_floor: f64,
    bound: f64,
    history_rows: usize,
    naive_tracking_error_bps: f64,
    solution: &'a ActiveRiskSolution,
}

/// Execute the optimize command.
pub fn execute(args: OptimizeArgs, format: OutputFormat) -> Result<()> {
    let config = BacktestConfig::from_file(&args.config)?;
    let floor = validate_fraction("floor", args.floor.unwrap_or(config.cash_drag_floor))?;

    let mut optimizer_config = config.optimizer.clone();
    if let Some(bound) = args.bound {
        optimizer_config = optimizer_config.with_bound(validate_fraction("bound", bound)?);
    }
    let optimizer = TrackingErrorOptimizer::new(optimizer_config);

    let matrix = config.load_returns()?;
    let history = match config.strategy.lookback {
        Some(n) => matrix.tail(n),
        None => matrix,
    };

    let solution = optimizer.solve(&config.benchmark, floor, &history)?;
    let naive = naive_cash_drag_tilt(&config.benchmark, floor)?;
    let naive_te = naive_tracking_error_bps(&config.benchmark, &naive, &history)?;
    info!(
        optimized_bps = solution.tracking_error_bps,
        naive_bps = naive_te,
        "optimization complete"
    );

    match format {
        OutputFormat::Json => print_json(&OptimizeReport {
            cash_drag_floor: floor,
            bound: optimizer.config().bound,
            history_rows: history.len(),
            naive_tracking_error_bps: naive_te,
            solution: &solution,
        })?,
        OutputFormat::Minimal => println!("{:.4}", solution.tracking_error_bps),
        _ => {
            let active = active_weights(&solution.portfolio_weights, &config.benchmark);
            let rows: Vec<WeightRow> = active
                .by_security
                .iter()
                .map(|(id, w)| WeightRow {
                    security: id.to_string(),
                    benchmark: w.benchmark_weight,
                    naive: naive.get(id).unwrap_or(0.0),
                    optimized: w.portfolio_weight,
                    active: w.active_weight,
                })
                .collect();

            if format == OutputFormat::Table {
                print_header("Minimum Tracking Error Weights");
            }
            print_output(&rows, format)?;

            if format == OutputFormat::Table {
                let largest = match active.largest_active_positions(1).first() {
                    Some((id, w)) => format!("{} {}", id, format_weight(*w)),
                    None => "-".to_string(),
                };
                let summary = vec![
                    KeyValue::from_percent("Cash Drag Floor", floor),
                    KeyValue::from_percent("Active Bound", optimizer.config().bound),
                    KeyValue::new("History Rows", history.len().to_string()),
                    KeyValue::from_bps("Optimized TE (1d)", solution.tracking_error_bps),
                    KeyValue::from_bps("Naive TE (1d)", naive_te),
                    KeyValue::from_percent("Total Active Weight", active.total_active_weight),
                    KeyValue::new("Largest Active", largest),
                    KeyValue::new("Solver Iterations", solution.iterations.to_string()),
                ];
                print_header("Summary");
                print_output(&summary, format)?;
            }
        }
    }

    Ok(())
}

/// One-day tracking error of `portfolio` against `benchmark`.
fn naive_tracking_error_bps(
    benchmark: &WeightVector,
    portfolio: &WeightVector,
    history: &ReturnsMatrix,
) -> Result<f64> {
    let ids: Vec<SecurityId> = benchmark.with_cash_last().ids().cloned().collect();
    let active: Vec<f64> = ids
        .iter()
        .map(|id| portfolio.get(id).unwrap_or(0.0) - benchmark.get(id).unwrap_or(0.0))
        .collect();
    let covariance = history.covariance(&ids)?;
    Ok(ex_ante_tracking_error_bps(&active, &covariance)?)
}
