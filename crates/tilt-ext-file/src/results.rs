//! CSV result files.
//!
//! Attribution rows use the columns
//! `ticker,start_wt,start_date,end_date,period_return,end_wt`; an excluded
//! security leaves `period_return` blank. Returns matrices are written with a
//! `Dates` column followed by one column per security.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tilt_core::types::SecurityId;
use tilt_portfolio::returns::ReturnsMatrix;
use tilt_portfolio::simulation::PeriodAttribution;
use tracing::debug;

use crate::error::{FileError, FileResult};
use crate::market_data::{parse_date, read_records};

#[derive(Debug, Serialize, Deserialize)]
struct AttributionRecord {
    ticker: String,
    start_wt: f64,
    start_date: String,
    end_date: String,
    period_return: Option<f64>,
    end_wt: f64,
}

impl From<&PeriodAttribution> for AttributionRecord {
    fn from(row: &PeriodAttribution) -> Self {
        Self {
            ticker: row.security.to_string(),
            start_wt: row.start_wt,
            start_date: row.start_date.to_string(),
            end_date: row.end_date.to_string(),
            period_return: row.period_return,
            end_wt: row.end_wt,
        }
    }
}

/// Writes attribution rows as CSV to any writer.
///
/// # Errors
///
/// `FileError::Io` when writing fails; `label` names the destination.
pub fn write_attribution<W: Write>(
    writer: W,
    rows: &[PeriodAttribution],
    label: &Path,
) -> FileResult<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for row in rows {
        csv.serialize(AttributionRecord::from(row))
            .map_err(|e| FileError::io(label, e))?;
    }
    csv.flush().map_err(|e| FileError::io(label, e))
}

/// Writes attribution rows to `path`, replacing any existing file.
///
/// # Errors
///
/// `FileError::Io` when the file cannot be created or written.
pub fn write_attribution_csv(path: impl AsRef<Path>, rows: &[PeriodAttribution]) -> FileResult<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| FileError::io(path, e))?;
    write_attribution(file, rows, path)?;
    debug!(file = %path.display(), rows = rows.len(), "wrote attribution");
    Ok(())
}

/// Reads attribution rows written by [`write_attribution_csv`].
///
/// # Errors
///
/// `FileError::NotFound` for a missing file, `FileError::Parse` for
/// malformed rows.
pub fn read_attribution_csv(path: impl AsRef<Path>) -> FileResult<Vec<PeriodAttribution>> {
    let path = path.as_ref();
    read_records::<AttributionRecord>(path)?
        .into_iter()
        .map(|(line, r)| {
            Ok(PeriodAttribution {
                security: SecurityId::new(r.ticker),
                start_date: parse_date(path, line, &r.start_date)?,
                end_date: parse_date(path, line, &r.end_date)?,
                start_wt: r.start_wt,
                period_return: r.period_return,
                end_wt: r.end_wt,
            })
        })
        .collect()
}

/// Writes a returns matrix to `path`.
///
/// # Errors
///
/// `FileError::Io` when the file cannot be created or written.
pub fn write_returns_csv(path: impl AsRef<Path>, matrix: &ReturnsMatrix) -> FileResult<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| FileError::io(path, e))?;
    write_returns(file, matrix, path)?;
    debug!(file = %path.display(), rows = matrix.len(), "wrote returns matrix");
    Ok(())
}

/// Writes a returns matrix as CSV to any writer.
///
/// # Errors
///
/// `FileError::Io` when writing fails; `label` names the destination.
pub fn write_returns<W: Write>(writer: W, matrix: &ReturnsMatrix, label: &Path) -> FileResult<()> {
    let mut csv = csv::Writer::from_writer(writer);

    let header = std::iter::once("Dates".to_string())
        .chain(matrix.columns().iter().map(SecurityId::to_string));
    csv.write_record(header).map_err(|e| FileError::io(label, e))?;

    for (i, date) in matrix.dates().iter().enumerate() {
        let cells = matrix
            .columns()
            .iter()
            .map(|id| matrix.column(id).map_or(0.0, |col| col[i]).to_string());
        let record = std::iter::once(date.to_string()).chain(cells);
        csv.write_record(record).map_err(|e| FileError::io(label, e))?;
    }
    csv.flush().map_err(|e| FileError::io(label, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::fs;
    use tempfile::TempDir;
    use tilt_core::types::Date;

    fn d(s: &str) -> Date {
        Date::parse(s).unwrap()
    }

    fn rows() -> Vec<PeriodAttribution> {
        vec![
            PeriodAttribution {
                security: SecurityId::new("TD CN"),
                start_date: d("2024-01-31"),
                end_date: d("2024-02-29"),
                start_wt: 0.6,
                period_return: Some(0.0125),
                end_wt: 0.61,
            },
            PeriodAttribution {
                security: SecurityId::new("CM CN"),
                start_date: d("2024-01-31"),
                end_date: d("2024-02-29"),
                start_wt: 0.4,
                period_return: None,
                end_wt: 0.0,
            },
        ]
    }

    #[test]
    fn test_attribution_file_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.csv");
        write_attribution_csv(&path, &rows()).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("ticker,start_wt,start_date,end_date,period_return,end_wt")
        );
        assert_eq!(lines.next(), Some("TD CN,0.6,2024-01-31,2024-02-29,0.0125,0.61"));
        assert_eq!(lines.next(), Some("CM CN,0.4,2024-01-31,2024-02-29,,0.0"));
    }

    #[test]
    fn test_attribution_read_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.csv");
        write_attribution_csv(&path, &rows()).unwrap();

        let back = read_attribution_csv(&path).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[1].period_return, None);
        assert_relative_eq!(back[0].contribution(), 0.6 * 0.0125);
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_attribution_csv("/nonexistent/results.csv").unwrap_err();
        assert!(matches!(err, FileError::NotFound { .. }));
    }

    #[test]
    fn test_returns_matrix_file() {
        let matrix = ReturnsMatrix::new(
            vec![d("2024-01-03"), d("2024-01-04")],
            vec![SecurityId::new("TD CN")],
            vec![vec![0.01, -0.02]],
        )
        .unwrap();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("returns.csv");
        write_returns_csv(&path, &matrix).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Dates,TD CN,cash");
        assert_eq!(lines[1], "2024-01-03,0.01,0");
        assert_eq!(lines[2], "2024-01-04,-0.02,0");
    }
}
