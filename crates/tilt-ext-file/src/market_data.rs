//! CSV price and dividend files.
//!
//! A market-data directory holds one `<ROOT>.csv` per security, where `ROOT`
//! is the ticker before the first space (`TD CN` reads `TD.csv`), with
//! `Dates` and `PX_LAST` columns, plus one shared dividends file with
//! `ticker`, `ex_date` and `dvd_amount` columns.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tilt_core::error::{CoreError, CoreResult};
use tilt_core::traits::PriceHistorySource;
use tilt_core::types::{Date, DateRange, DividendSchedule, PriceHistory, SecurityId};
use tracing::{debug, info, warn};

use crate::error::{FileError, FileResult};

/// Default name of the shared dividends file.
pub const DEFAULT_DIVIDENDS_FILE: &str = "dividends.csv";

// =============================================================================
// RECORDS
// =============================================================================

#[derive(Debug, Deserialize)]
struct PriceRecord {
    #[serde(rename = "Dates")]
    date: String,
    #[serde(rename = "PX_LAST")]
    last_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DividendRecord {
    ticker: String,
    ex_date: String,
    #[serde(default)]
    dvd_amount: Option<f64>,
}

/// Reads every record of a headed CSV file, with its line number.
pub(crate) fn read_records<T: DeserializeOwned>(path: &Path) -> FileResult<Vec<(u64, T)>> {
    if !path.is_file() {
        return Err(FileError::not_found(path));
    }
    let mut reader = csv::Reader::from_path(path).map_err(|e| FileError::from_csv(path, &e))?;
    let headers = reader
        .headers()
        .map_err(|e| FileError::from_csv(path, &e))?
        .clone();

    let mut records = Vec::new();
    for result in reader.records() {
        let raw = result.map_err(|e| FileError::from_csv(path, &e))?;
        let line = raw.position().map_or(0, csv::Position::line);
        let record: T = raw
            .deserialize(Some(&headers))
            .map_err(|e| FileError::parse(path, line, e.to_string()))?;
        records.push((line, record));
    }
    Ok(records)
}

pub(crate) fn parse_date(path: &Path, line: u64, value: &str) -> FileResult<Date> {
    Date::parse(value).map_err(|e| FileError::parse(path, line, e.to_string()))
}

// =============================================================================
// CSV MARKET DATA
// =============================================================================

/// Price histories read from a directory of CSV files.
///
/// Dividends are loaded once when the source is opened; price files are read
/// on every request.
#[derive(Debug, Clone)]
pub struct CsvMarketData {
    directory: PathBuf,
    dividends_file: PathBuf,
    dividends: BTreeMap<SecurityId, DividendSchedule>,
}

impl CsvMarketData {
    /// Opens a market-data directory using [`DEFAULT_DIVIDENDS_FILE`].
    ///
    /// # Errors
    ///
    /// `CoreError::Validation` when the dividends file is missing,
    /// `CoreError::DataSource` when it cannot be parsed.
    pub fn new(directory: impl AsRef<Path>) -> CoreResult<Self> {
        Self::with_dividends_file(directory, DEFAULT_DIVIDENDS_FILE)
    }

    /// Opens a market-data directory with a custom dividends file name.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn with_dividends_file(
        directory: impl AsRef<Path>,
        dividends_file: impl AsRef<Path>,
    ) -> CoreResult<Self> {
        let directory = directory.as_ref().to_path_buf();
        let dividends_file = directory.join(dividends_file);
        let mut source = Self {
            directory,
            dividends_file,
            dividends: BTreeMap::new(),
        };
        source.reload()?;
        Ok(source)
    }

    /// Directory holding the price files.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the price file for `security`.
    pub fn price_file(&self, security: &SecurityId) -> PathBuf {
        self.directory.join(format!("{}.csv", security.root_ticker()))
    }

    /// Dividends loaded for `security`, if any.
    pub fn dividends(&self, security: &SecurityId) -> Option<&DividendSchedule> {
        self.dividends.get(security)
    }

    /// Reloads the dividends file.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn reload(&mut self) -> CoreResult<()> {
        let path = &self.dividends_file;
        let records: Vec<(u64, DividendRecord)> = match read_records(path) {
            Ok(records) => records,
            Err(FileError::NotFound { .. }) => {
                return Err(CoreError::validation(
                    "dividends",
                    format!("dividend file {} does not exist", path.display()),
                ))
            }
            Err(e) => return Err(e.into()),
        };

        let mut dividends: BTreeMap<SecurityId, DividendSchedule> = BTreeMap::new();
        for (line, record) in records {
            let ex_date = parse_date(path, line, &record.ex_date)?;
            dividends
                .entry(SecurityId::new(record.ticker.trim()))
                .or_default()
                .insert(ex_date, record.dvd_amount.unwrap_or(0.0));
        }

        debug!(
            file = %path.display(),
            securities = dividends.len(),
            "loaded dividends"
        );
        self.dividends = dividends;
        Ok(())
    }

    fn read_closes(
        &self,
        security: &SecurityId,
        range: &DateRange,
    ) -> CoreResult<Vec<(Date, f64)>> {
        let path = self.price_file(security);
        let records: Vec<(u64, PriceRecord)> = match read_records(&path) {
            Ok(records) => records,
            Err(FileError::NotFound { .. }) => {
                return Err(CoreError::validation(
                    security.as_str(),
                    format!("no market data available at {}", path.display()),
                ))
            }
            Err(e) => return Err(e.into()),
        };

        let mut closes = Vec::with_capacity(records.len());
        for (line, record) in records {
            let date = parse_date(&path, line, &record.date)?;
            if !range.contains(date) {
                continue;
            }
            match record.last_price {
                Some(price) => closes.push((date, price)),
                None => debug!(security = %security, %date, "skipping row without a price"),
            }
        }
        Ok(closes)
    }
}

impl PriceHistorySource for CsvMarketData {
    fn price_history(&self, security: &SecurityId, range: &DateRange) -> CoreResult<PriceHistory> {
        let closes = self.read_closes(security, range)?;

        let dividends = match self.dividends.get(security) {
            Some(schedule) => schedule.restrict(range),
            None => {
                info!(security = %security, "no dividend data, treating as dividend-free");
                DividendSchedule::new()
            }
        };

        let history = PriceHistory::from_closes(security.clone(), closes, &dividends)?;
        for ex_date in dividends.unmatched_dates(&history) {
            warn!(
                security = %security,
                %ex_date,
                "dividend ex-date is not a trading day in the price file; dropped"
            );
        }

        debug!(
            security = %security,
            observations = history.len(),
            dividends = dividends.len(),
            "loaded price history"
        );
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn d(s: &str) -> Date {
        Date::parse(s).unwrap()
    }

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("TD.csv"),
            "Dates,PX_LAST\n2024-01-02,80.0\n2024-01-03,81.0\n2024-01-04,\n2024-01-05,79.5\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("RY.csv"),
            "Dates,PX_LAST\n2024-01-02 00:00:00,130.0\n2024-01-03 00:00:00,131.5\n",
        )
        .unwrap();
        fs::write(
            dir.path().join(DEFAULT_DIVIDENDS_FILE),
            "ticker,ex_date,dvd_amount\nTD CN,2024-01-05,1.02\nTD CN,2024-01-06,0.5\nBNS CN,2024-01-03,\n",
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_price_history_with_dividends() {
        let dir = fixture();
        let source = CsvMarketData::new(dir.path()).unwrap();
        let h = source
            .price_history(&SecurityId::new("TD CN"), &DateRange::unbounded())
            .unwrap();

        // Blank price row skipped.
        assert_eq!(h.len(), 3);
        assert_eq!(h.observations[2].date, d("2024-01-05"));
        assert_eq!(h.observations[2].dividend, Some(1.02));
        assert_eq!(h.observations[0].dividend, None);
    }

    #[test]
    fn test_security_without_dividends() {
        let dir = fixture();
        let source = CsvMarketData::new(dir.path()).unwrap();
        let h = source
            .price_history(&SecurityId::new("RY CN"), &DateRange::unbounded())
            .unwrap();
        assert_eq!(h.len(), 2);
        assert!(h.observations.iter().all(|o| o.dividend.is_none()));
    }

    #[test]
    fn test_blank_dividend_amount_is_zero() {
        let dir = fixture();
        let source = CsvMarketData::new(dir.path()).unwrap();
        let bns = source.dividends(&SecurityId::new("BNS CN")).unwrap();
        assert_eq!(bns.get(d("2024-01-03")), Some(0.0));
    }

    #[test]
    fn test_range_filter() {
        let dir = fixture();
        let source = CsvMarketData::new(dir.path()).unwrap();
        let range = DateRange::unbounded().with_start(d("2024-01-03"));
        let h = source
            .price_history(&SecurityId::new("TD CN"), &range)
            .unwrap();
        assert_eq!(h.observations[0].date, d("2024-01-03"));
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn test_missing_price_file() {
        let dir = fixture();
        let source = CsvMarketData::new(dir.path()).unwrap();
        let err = source
            .price_history(&SecurityId::new("CM CN"), &DateRange::unbounded())
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation { ref security, .. } if security == "CM CN"));
    }

    #[test]
    fn test_missing_dividend_file() {
        let dir = TempDir::new().unwrap();
        let err = CsvMarketData::new(dir.path()).unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
    }

    #[test]
    fn test_bad_date_reports_line() {
        let dir = fixture();
        fs::write(
            dir.path().join("NA.csv"),
            "Dates,PX_LAST\n2024-01-02,50.0\nnot-a-date,51.0\n",
        )
        .unwrap();
        let source = CsvMarketData::new(dir.path()).unwrap();
        let err = source
            .price_history(&SecurityId::new("NA CN"), &DateRange::unbounded())
            .unwrap_err();
        assert!(matches!(err, CoreError::DataSource { .. }));
        assert!(err.to_string().contains("line 3"));
    }
}
