//! Aligned daily returns matrices.
//!
//! A [`ReturnsMatrix`] holds one column of daily fractional returns per
//! security on a shared date axis. The synthetic cash column is always
//! present, always last, and always zero. There are no missing cells.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use tilt_core::traits::PriceHistorySource;
use tilt_core::types::{Date, DateRange, SecurityId, TotalReturnSeries};
use tilt_math::linear_algebra::sample_covariance;
use tracing::{debug, info};

use super::total_return::{build_total_returns, daily_returns};
use crate::error::{PortfolioError, PortfolioResult};
use crate::types::ReturnsConfig;

/// Daily returns on a common date axis, one column per security.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnsMatrix {
    dates: Vec<Date>,
    columns: Vec<SecurityId>,
    /// Column-major values: `values[c][r]`.
    values: Vec<Vec<f64>>,
}

impl ReturnsMatrix {
    /// Creates a matrix from column-major values.
    ///
    /// A zero cash column is appended when absent; a cash column passed
    /// elsewhere is moved to the end.
    ///
    /// # Errors
    ///
    /// `Validation` when dates are not strictly increasing, ids repeat, a
    /// column length differs from the axis, a value is not finite, or a
    /// supplied cash column holds non-zero values.
    pub fn new(
        dates: Vec<Date>,
        columns: Vec<SecurityId>,
        values: Vec<Vec<f64>>,
    ) -> PortfolioResult<Self> {
        if let Some(w) = dates.windows(2).find(|w| w[0] >= w[1]) {
            return Err(PortfolioError::validation(
                "returns matrix",
                format!("dates must be strictly increasing ({} then {})", w[0], w[1]),
            ));
        }
        if columns.len() != values.len() {
            return Err(PortfolioError::validation(
                "returns matrix",
                format!("{} column ids for {} columns", columns.len(), values.len()),
            ));
        }
        ensure_unique(&columns)?;

        let mut named = Vec::with_capacity(columns.len() + 1);
        for (id, col) in columns.into_iter().zip(values) {
            if col.len() != dates.len() {
                return Err(PortfolioError::validation(
                    format!("'{id}'"),
                    format!("column has {} values for {} dates", col.len(), dates.len()),
                ));
            }
            if let Some(v) = col.iter().find(|v| !v.is_finite()) {
                return Err(PortfolioError::validation(
                    format!("'{id}'"),
                    format!("non-finite return {v}"),
                ));
            }
            if id.is_cash() {
                if col.iter().any(|v| *v != 0.0) {
                    return Err(PortfolioError::validation(
                        "'cash'",
                        "cash returns must be zero",
                    ));
                }
                continue;
            }
            named.push((id, col));
        }
        named.push((SecurityId::cash(), vec![0.0; dates.len()]));

        let (columns, values) = named.into_iter().unzip();
        Ok(Self {
            dates,
            columns,
            values,
        })
    }

    /// The date axis.
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Column ids, cash last.
    pub fn columns(&self) -> &[SecurityId] {
        &self.columns
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// True if the matrix has no rows.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// First date on the axis.
    pub fn first_date(&self) -> Option<Date> {
        self.dates.first().copied()
    }

    /// Last date on the axis.
    pub fn last_date(&self) -> Option<Date> {
        self.dates.last().copied()
    }

    /// True if `id` is a column.
    pub fn contains(&self, id: &SecurityId) -> bool {
        self.position(id).is_some()
    }

    fn position(&self, id: &SecurityId) -> Option<usize> {
        self.columns.iter().position(|c| c == id)
    }

    fn row_index(&self, date: Date) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    /// The returns of one security.
    pub fn column(&self, id: &SecurityId) -> Option<&[f64]> {
        self.position(id).map(|c| self.values[c].as_slice())
    }

    /// The return of `id` on `date`.
    pub fn value(&self, date: Date, id: &SecurityId) -> Option<f64> {
        let r = self.row_index(date)?;
        let c = self.position(id)?;
        Some(self.values[c][r])
    }

    /// All returns on `date`, in column order.
    pub fn row(&self, date: Date) -> Option<Vec<f64>> {
        let r = self.row_index(date)?;
        Some(self.values.iter().map(|col| col[r]).collect())
    }

    fn slice_rows(&self, from: usize, to: usize) -> Self {
        let to = to.max(from);
        Self {
            dates: self.dates[from..to].to_vec(),
            columns: self.columns.clone(),
            values: self.values.iter().map(|c| c[from..to].to_vec()).collect(),
        }
    }

    /// Rows with `after < date <= up_to`.
    #[must_use]
    pub fn window(&self, after: Date, up_to: Date) -> Self {
        let from = self.dates.partition_point(|d| *d <= after);
        let to = self.dates.partition_point(|d| *d <= up_to);
        self.slice_rows(from, to)
    }

    /// Rows strictly before `date`.
    #[must_use]
    pub fn before(&self, date: Date) -> Self {
        let to = self.dates.partition_point(|d| *d < date);
        self.slice_rows(0, to)
    }

    /// Rows with `start <= date <= end`.
    #[must_use]
    pub fn between(&self, start: Date, end: Date) -> Self {
        let from = self.dates.partition_point(|d| *d < start);
        let to = self.dates.partition_point(|d| *d <= end);
        self.slice_rows(from, to)
    }

    /// The last `n` rows.
    #[must_use]
    pub fn tail(&self, n: usize) -> Self {
        self.slice_rows(self.len().saturating_sub(n), self.len())
    }

    /// The given columns in the given order, cash last.
    ///
    /// # Errors
    ///
    /// `DataGap` when an id is not a column.
    pub fn select(&self, ids: &[SecurityId]) -> PortfolioResult<Self> {
        ensure_unique(ids)?;
        let mut columns = Vec::with_capacity(ids.len() + 1);
        let mut values = Vec::with_capacity(ids.len() + 1);
        for id in ids.iter().filter(|id| !id.is_cash()) {
            let col = self.column(id).ok_or_else(|| missing_column(id))?;
            columns.push(id.clone());
            values.push(col.to_vec());
        }
        columns.push(SecurityId::cash());
        values.push(vec![0.0; self.len()]);
        Ok(Self {
            dates: self.dates.clone(),
            columns,
            values,
        })
    }

    /// Sample covariance (denominator `n - 1`) of the given columns, in the
    /// given order.
    ///
    /// # Errors
    ///
    /// `DataGap` when an id is not a column, `Validation` when there are
    /// fewer than two rows.
    pub fn covariance(&self, ids: &[SecurityId]) -> PortfolioResult<DMatrix<f64>> {
        let columns = ids
            .iter()
            .map(|id| self.column(id).ok_or_else(|| missing_column(id)))
            .collect::<PortfolioResult<Vec<&[f64]>>>()?;
        Ok(sample_covariance(&columns)?)
    }
}

fn missing_column(id: &SecurityId) -> PortfolioError {
    PortfolioError::data_gap(id.as_str(), "not a column of the returns matrix")
}

fn ensure_unique(ids: &[SecurityId]) -> PortfolioResult<()> {
    let mut seen = HashSet::with_capacity(ids.len());
    match ids.iter().find(|id| !seen.insert(*id)) {
        Some(dup) => Err(PortfolioError::validation(
            format!("'{dup}'"),
            "security requested more than once",
        )),
        None => Ok(()),
    }
}

/// Fills `None` cells from the previous value, then leading gaps from the
/// first value.
fn fill_column(cells: Vec<Option<f64>>) -> Option<Vec<f64>> {
    let first = cells.iter().flatten().copied().next()?;
    let mut last = first;
    Some(
        cells
            .into_iter()
            .map(|c| {
                if let Some(v) = c {
                    last = v;
                }
                last
            })
            .collect(),
    )
}

/// Aligns total-return series onto the union of their dates.
///
/// Each series is restricted to `range`, turned into daily returns over its
/// own consecutive observations, placed on the sorted union date axis,
/// forward- then backward-filled, and the earliest row dropped. A zero cash
/// column is appended last; series for the cash id are ignored.
///
/// # Errors
///
/// `Validation` for duplicate securities or no non-cash series;
/// `DataGap` for a series with fewer than two observations in range.
pub fn assemble_from_series(
    series: &[TotalReturnSeries],
    range: &DateRange,
) -> PortfolioResult<ReturnsMatrix> {
    let ids: Vec<SecurityId> = series.iter().map(|s| s.security().clone()).collect();
    ensure_unique(&ids)?;

    let priced: Vec<&TotalReturnSeries> = series
        .iter()
        .filter(|s| !s.security().is_cash())
        .collect();
    if priced.is_empty() {
        return Err(PortfolioError::validation(
            "returns matrix",
            "no non-cash securities requested",
        ));
    }

    let mut axis = BTreeSet::new();
    let mut per_security = Vec::with_capacity(priced.len());
    for s in &priced {
        let points: Vec<_> = s
            .points()
            .iter()
            .copied()
            .filter(|p| range.contains(p.date))
            .collect();
        if points.len() < 2 {
            return Err(PortfolioError::data_gap(
                s.security().as_str(),
                format!("fewer than two prices in {range}"),
            ));
        }
        axis.extend(points.iter().map(|p| p.date));
        let restricted = TotalReturnSeries::new(s.security().clone(), points)?;
        let returns: BTreeMap<Date, f64> = daily_returns(&restricted).into_iter().collect();
        per_security.push((s.security().clone(), returns));
    }

    let axis: Vec<Date> = axis.into_iter().collect();
    let mut columns = Vec::with_capacity(per_security.len());
    let mut values = Vec::with_capacity(per_security.len());
    for (id, returns) in per_security {
        let cells: Vec<Option<f64>> = axis.iter().map(|d| returns.get(d).copied()).collect();
        let filled = fill_column(cells).ok_or_else(|| {
            PortfolioError::data_gap(id.as_str(), "no returns on the date axis")
        })?;
        columns.push(id);
        values.push(filled[1..].to_vec());
    }

    debug!(
        securities = columns.len(),
        rows = axis.len() - 1,
        "aligned returns matrix"
    );

    ReturnsMatrix::new(axis[1..].to_vec(), columns, values)
}

/// Builds returns matrices from a [`PriceHistorySource`].
#[derive(Debug, Clone)]
pub struct ReturnsMatrixAssembler<S> {
    source: S,
    config: ReturnsConfig,
}

impl<S: PriceHistorySource> ReturnsMatrixAssembler<S> {
    /// Creates an assembler with default configuration.
    pub fn new(source: S) -> Self {
        Self {
            source,
            config: ReturnsConfig::default(),
        }
    }

    /// Sets the configuration.
    #[must_use]
    pub fn with_config(mut self, config: ReturnsConfig) -> Self {
        self.config = config;
        self
    }

    /// The underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Loads, converts and aligns the requested securities.
    ///
    /// `cash` may appear anywhere in `securities`; it always ends up as the
    /// last column.
    ///
    /// # Errors
    ///
    /// `Validation` for duplicate ids, no non-cash securities, or malformed
    /// prices; `DataGap` for securities with no returns in range;
    /// `DataSource` for loader failures.
    pub fn assemble(
        &self,
        securities: &[SecurityId],
        range: &DateRange,
    ) -> PortfolioResult<ReturnsMatrix> {
        ensure_unique(securities)?;
        let histories = securities
            .iter()
            .filter(|id| !id.is_cash())
            .map(|id| self.source.price_history(id, range))
            .collect::<Result<Vec<_>, _>>()?;

        let series = build_total_returns(&histories, &self.config)?;
        let matrix = assemble_from_series(&series, range)?;

        info!(
            securities = matrix.columns().len() - 1,
            rows = matrix.len(),
            range = %range,
            "assembled returns matrix"
        );
        Ok(matrix)
    }
}
