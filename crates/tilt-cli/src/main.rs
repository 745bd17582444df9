//! Tilt CLI - Command-line interface for portfolio return analytics.
//!
//! # Usage
//!
//! ```bash
//! # Dividend-reinvested price series for one security
//! tilt total-return --data-dir market_data --ticker "TD CN"
//!
//! # Aligned returns matrix
//! tilt returns --config backtest.toml --output returns.csv
//!
//! # Minimum tracking-error weights under a cash-drag floor
//! tilt optimize --config backtest.toml
//!
//! # Backtest and write attribution
//! tilt backtest --config backtest.toml --output backtest_results.csv
//!
//! # Show a previous run
//! tilt results --input backtest_results.csv
//! ```

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod commands;
mod config;
mod error;
mod output;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so that JSON and CSV output stay clean
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let format = cli.format;

    match cli.command {
        Commands::TotalReturn(args) => commands::total_return::execute(args, format)?,
        Commands::Returns(args) => commands::returns::execute(args, format)?,
        Commands::Optimize(args) => commands::optimize::execute(args, format)?,
        Commands::Backtest(args) => commands::backtest::execute(args, format)?,
        Commands::Results(args) => commands::results::execute(args, format)?,
    }

    Ok(())
}
