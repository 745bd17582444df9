//! Backtest command implementation.
//!
//! Runs the configured strategy over the assembled returns matrix and
//! reports portfolio returns per rebalance period.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use tilt_ext_file::write_attribution_csv;
use tilt_portfolio::{run_backtest, PeriodReturn};

use crate::cli::OutputFormat;
use crate::config::BacktestConfig;
use crate::output::{
    format_percent, print_header, print_json, print_output, print_success, print_warning,
    KeyValue,
};

/// Arguments for the backtest command.
#[derive(Args, Debug)]
pub struct BacktestArgs {
    /// Backtest configuration file (TOML)
    #[arg(short, long)]
    pub config: PathBuf,

    /// Write per-security attribution rows to this CSV file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Portfolio return of one period.
#[derive(Debug, Serialize, Tabled)]
pub struct PeriodRow {
    #[tabled(rename = "Start")]
    pub start_date: String,
    #[tabled(rename = "End")]
    pub end_date: String,
    #[tabled(rename = "Return", display_with = "display_percent")]
    pub portfolio_return: f64,
}

impl From<&PeriodReturn> for PeriodRow {
    fn from(p: &PeriodReturn) -> Self {
        Self {
            start_date: p.start_date.to_string(),
            end_date: p.end_date.to_string(),
            portfolio_return: p.portfolio_return,
        }
    }
}

fn display_percent(value: &f64) -> String {
    format_percent(*value)
}

/// Execute the backtest command.
pub fn execute(args: BacktestArgs, format: OutputFormat) -> Result<()> {
    let config = BacktestConfig::from_file(&args.config)?;
    let returns = config.load_returns()?;
    let boundaries = config.boundaries(&returns)?;
    let strategy = config.strategy()?;

    let report = run_backtest(
        &returns,
        &boundaries,
        &strategy,
        &config.optimizer(),
        &config.simulation,
    )?;

    let excluded = report
        .rows
        .iter()
        .filter(|r| r.period_return.is_none())
        .count();
    if excluded > 0 {
        print_warning(&format!(
            "{} security-periods excluded for missing data",
            excluded
        ));
    }

    if let Some(ref path) = args.output {
        write_attribution_csv(path, &report.rows)?;
    }

    let periods: Vec<PeriodRow> = report.periods.iter().map(PeriodRow::from).collect();
    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Minimal => println!("{}", report.cumulative_return),
        OutputFormat::Csv => print_output(&periods, format)?,
        OutputFormat::Table => {
            print_header("Period Returns");
            print_output(&periods, format)?;

            let summary = vec![
                KeyValue::new("Periods", report.periods.len().to_string()),
                KeyValue::new("Boundaries", boundaries.len().to_string()),
                KeyValue::from_percent("Cumulative Return", report.cumulative_return),
            ];
            print_header("Summary");
            print_output(&summary, format)?;

            if let Some(ref path) = args.output {
                print_success(&format!(
                    "Wrote {} attribution rows to {}",
                    report.rows.len(),
                    path.display()
                ));
            }
        }
    }

    Ok(())
}
