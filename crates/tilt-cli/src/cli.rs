//! CLI argument definitions.

use clap::{Parser, Subcommand, ValueEnum};

use crate::commands::{BacktestArgs, OptimizeArgs, ResultsArgs, ReturnsArgs, TotalReturnArgs};

/// Tilt - Total-return, active-risk and weight-drift analytics
#[derive(Parser)]
#[command(name = "tilt")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    /// Log debug detail to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Build the dividend-reinvested price series of one security
    TotalReturn(TotalReturnArgs),

    /// Assemble the aligned daily returns matrix for a configuration
    Returns(ReturnsArgs),

    /// Minimize tracking error against the configured benchmark
    Optimize(OptimizeArgs),

    /// Run the configured strategy and report period returns
    Backtest(BacktestArgs),

    /// Show a previously written attribution file
    Results(ResultsArgs),
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// CSV format
    Csv,
    /// Minimal output (just the headline value)
    Minimal,
}
