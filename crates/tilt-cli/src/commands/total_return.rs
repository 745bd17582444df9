//! Total-return command implementation.
//!
//! Builds the dividend-reinvested price series of one security from a
//! market-data directory.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use tilt_core::traits::PriceHistorySource;
use tilt_core::types::{DateRange, DividendSchedule, SecurityId};
use tilt_ext_file::{CsvMarketData, DEFAULT_DIVIDENDS_FILE};
use tilt_portfolio::{build_total_return, daily_returns};

use crate::cli::OutputFormat;
use crate::commands::parse_date;
use crate::output::{
    format_optional_percent, print_header, print_output, print_success, KeyValue,
};

/// Arguments for the total-return command.
#[derive(Args, Debug)]
pub struct TotalReturnArgs {
    /// Directory with `<TICKER>.csv` price files and the dividends file
    #[arg(short, long, default_value = "market_data")]
    pub data_dir: PathBuf,

    /// Dividends file name inside the data directory
    #[arg(long, default_value = DEFAULT_DIVIDENDS_FILE)]
    pub dividends_file: String,

    /// Security identifier, e.g. "TD CN"
    #[arg(short, long)]
    pub ticker: String,

    /// First date (YYYY-MM-DD)
    #[arg(short, long)]
    pub start: Option<String>,

    /// Last date (YYYY-MM-DD)
    #[arg(short, long)]
    pub end: Option<String>,
}

/// One row of the total-return series.
#[derive(Debug, Serialize, Tabled)]
pub struct TotalReturnRow {
    #[tabled(rename = "Date")]
    pub date: String,
    #[tabled(rename = "Price")]
    pub price: f64,
    #[tabled(rename = "Dividend", display_with = "display_dividend")]
    pub dividend: Option<f64>,
    #[tabled(rename = "TR Price")]
    pub total_return_price: f64,
    #[tabled(rename = "Daily Return", display_with = "format_optional_percent")]
    pub daily_return: Option<f64>,
}

fn display_dividend(value: &Option<f64>) -> String {
    value.map_or_else(String::new, |d| d.to_string())
}

/// Execute the total-return command.
pub fn execute(args: TotalReturnArgs, format: OutputFormat) -> Result<()> {
    let mut range = DateRange::unbounded();
    if let Some(ref s) = args.start {
        range = range.with_start(parse_date(s)?);
    }
    if let Some(ref e) = args.end {
        range = range.with_end(parse_date(e)?);
    }

    let source = CsvMarketData::with_dividends_file(&args.data_dir, &args.dividends_file)?;
    let security = SecurityId::new(args.ticker.as_str());
    let history = source.price_history(&security, &range)?;

    // Dividends already sit on the observations
    let series = build_total_return(&security, &history.observations, &DividendSchedule::new())?;
    let returns = daily_returns(&series);

    let rows: Vec<TotalReturnRow> = history
        .observations
        .iter()
        .zip(series.points())
        .enumerate()
        .map(|(i, (obs, point))| TotalReturnRow {
            date: point.date.to_string(),
            price: obs.last_price,
            dividend: obs.dividend,
            total_return_price: point.total_return_price,
            daily_return: i.checked_sub(1).and_then(|j| returns.get(j)).map(|(_, r)| *r),
        })
        .collect();

    match format {
        OutputFormat::Minimal => {
            if let Some(last) = rows.last() {
                println!("{}", last.total_return_price);
            }
        }
        OutputFormat::Table => {
            print_header(&format!("Total Return: {}", security));
            print_output(&rows, format)?;
            let (first, last) = match (series.points().first(), series.points().last()) {
                (Some(f), Some(l)) => (f.total_return_price, l.total_return_price),
                _ => return Ok(()),
            };
            let summary = vec![
                KeyValue::new("Observations", rows.len().to_string()),
                KeyValue::new(
                    "Dividends",
                    rows.iter().filter(|r| r.dividend.is_some()).count().to_string(),
                ),
                KeyValue::from_percent("Total Return", last / first - 1.0),
            ];
            print_header("Summary");
            print_output(&summary, format)?;
            print_success(&format!("{} observations", rows.len()));
        }
        _ => print_output(&rows, format)?,
    }

    Ok(())
}
