//! Results command implementation.
//!
//! Reads an attribution file written by `tilt backtest` and recomputes its
//! period and cumulative returns.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use tilt_ext_file::read_attribution_csv;
use tilt_portfolio::{cumulative_return, portfolio_period_returns, PeriodAttribution};

use crate::cli::OutputFormat;
use crate::output::{
    format_optional_percent, format_weight, print_header, print_output, KeyValue,
};

/// Arguments for the results command.
#[derive(Args, Debug)]
pub struct ResultsArgs {
    /// Attribution CSV written by the backtest command
    #[arg(short, long, default_value = "backtest_results.csv")]
    pub input: PathBuf,
}

/// One attribution row.
#[derive(Debug, Serialize, Tabled)]
pub struct AttributionRow {
    #[tabled(rename = "Security")]
    pub ticker: String,
    #[tabled(rename = "Start")]
    pub start_date: String,
    #[tabled(rename = "End")]
    pub end_date: String,
    #[tabled(rename = "Start Wt", display_with = "display_weight")]
    pub start_wt: f64,
    #[tabled(rename = "Return", display_with = "format_optional_percent")]
    pub period_return: Option<f64>,
    #[tabled(rename = "End Wt", display_with = "display_weight")]
    pub end_wt: f64,
}

impl From<&PeriodAttribution> for AttributionRow {
    fn from(row: &PeriodAttribution) -> Self {
        Self {
            ticker: row.security.to_string(),
            start_date: row.start_date.to_string(),
            end_date: row.end_date.to_string(),
            start_wt: row.start_wt,
            period_return: row.period_return,
            end_wt: row.end_wt,
        }
    }
}

fn display_weight(value: &f64) -> String {
    format_weight(*value)
}

/// Execute the results command.
pub fn execute(args: ResultsArgs, format: OutputFormat) -> Result<()> {
    let rows = read_attribution_csv(&args.input)?;
    let periods = portfolio_period_returns(&rows);
    let cumulative = cumulative_return(&periods);

    if format == OutputFormat::Minimal {
        println!("{}", cumulative);
        return Ok(());
    }

    let display: Vec<AttributionRow> = rows.iter().map(AttributionRow::from).collect();
    if format == OutputFormat::Table {
        print_header(&format!("Attribution: {}", args.input.display()));
    }
    print_output(&display, format)?;

    if format == OutputFormat::Table {
        let summary = vec![
            KeyValue::new("Rows", rows.len().to_string()),
            KeyValue::new("Periods", periods.len().to_string()),
            KeyValue::from_percent("Cumulative Return", cumulative),
        ];
        print_header("Summary");
        print_output(&summary, format)?;
    }

    Ok(())
}
