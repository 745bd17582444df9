//! Returns command implementation.
//!
//! Assembles the aligned daily returns matrix described by a backtest
//! configuration.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;

use tilt_ext_file::{write_returns, write_returns_csv};

use crate::cli::OutputFormat;
use crate::config::BacktestConfig;
use crate::output::{print_dynamic_table, print_header, print_json, print_success};

/// Arguments for the returns command.
#[derive(Args, Debug)]
pub struct ReturnsArgs {
    /// Backtest configuration file (TOML)
    #[arg(short, long)]
    pub config: PathBuf,

    /// Write the matrix to this CSV file instead of printing it
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Execute the returns command.
pub fn execute(args: ReturnsArgs, format: OutputFormat) -> Result<()> {
    let config = BacktestConfig::from_file(&args.config)?;
    let matrix = config.load_returns()?;

    if let Some(path) = args.output {
        write_returns_csv(&path, &matrix)?;
        print_success(&format!(
            "Wrote {} rows x {} columns to {}",
            matrix.len(),
            matrix.columns().len(),
            path.display()
        ));
        return Ok(());
    }

    match format {
        OutputFormat::Table => {
            let mut header = vec!["Date".to_string()];
            header.extend(matrix.columns().iter().map(ToString::to_string));

            let rows = matrix
                .dates()
                .iter()
                .filter_map(|date| {
                    let values = matrix.row(*date)?;
                    let mut row = vec![date.to_string()];
                    row.extend(values.iter().map(|v| format!("{:.6}", v)));
                    Some(row)
                })
                .collect();

            print_header(&format!(
                "Daily Returns ({} to {})",
                display_date(matrix.first_date()),
                display_date(matrix.last_date())
            ));
            print_dynamic_table(header, rows);
        }
        OutputFormat::Json => print_json(&matrix)?,
        OutputFormat::Csv => write_returns(std::io::stdout(), &matrix, Path::new("<stdout>"))?,
        OutputFormat::Minimal => println!("{} {}", matrix.len(), matrix.columns().len()),
    }

    Ok(())
}

fn display_date(date: Option<tilt_core::types::Date>) -> String {
    date.map_or_else(|| "-".to_string(), |d| d.to_string())
}
