//! Rendering of command results to stdout.
//!
//! Logs and warnings go to stderr; only results are written here.

use colored::Colorize;
use serde::Serialize;
use tabled::{
    builder::Builder,
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

use crate::cli::OutputFormat;

/// Renders rows in the requested format.
///
/// `Minimal` writes the last row as compact JSON, which for a time series is
/// its most recent value.
pub fn print_output<T>(rows: &[T], format: OutputFormat) -> anyhow::Result<()>
where
    T: Serialize + Tabled,
{
    match format {
        OutputFormat::Table if rows.is_empty() => println!("No rows."),
        OutputFormat::Table => println!("{}", styled(Table::new(rows))),
        OutputFormat::Json => print_json(rows)?,
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(std::io::stdout());
            for row in rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
        OutputFormat::Minimal => {
            if let Some(last) = rows.last() {
                println!("{}", serde_json::to_string(last)?);
            }
        }
    }
    Ok(())
}

/// Writes any serializable value as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints a table whose columns are only known at runtime, such as one column
/// per security of a returns matrix.
pub fn print_dynamic_table(header: Vec<String>, rows: Vec<Vec<String>>) {
    let mut builder = Builder::default();
    builder.push_record(header);
    for row in rows {
        builder.push_record(row);
    }
    println!("{}", styled(builder.build()));
}

fn styled(mut table: Table) -> String {
    table
        .with(Style::rounded())
        .with(Modify::new(Columns::first()).with(Alignment::left()))
        .to_string()
}

/// `0.0125` -> `"1.2500%"`.
pub fn format_percent(value: f64) -> String {
    format!("{:.4}%", value * 100.0)
}

/// Weights are shown to six decimals.
pub fn format_weight(value: f64) -> String {
    format!("{:.6}", value)
}

/// Percentage, or `-` for an excluded security.
pub fn format_optional_percent(value: &Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), format_percent)
}

/// Section title.
pub fn print_header(title: &str) {
    println!("\n{}", title.bold().underline());
}

/// Confirmation line, e.g. after a file was written.
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Warning line on stderr.
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message);
}

/// One line of a summary table.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct KeyValue {
    #[tabled(rename = "Metric")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

impl KeyValue {
    /// Plain text value.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Fraction shown as a percentage.
    pub fn from_percent(key: impl Into<String>, value: f64) -> Self {
        Self::new(key, format_percent(value))
    }

    /// Basis points to two decimals.
    pub fn from_bps(key: impl Into<String>, bps: f64) -> Self {
        Self::new(key, format!("{:.2} bps", bps))
    }
}
