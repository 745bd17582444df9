//! Dividend-reinvested total-return series.
//!
//! Cash dividends are reinvested on their ex-date into a running pool that
//! then grows with the price. The total-return price on each day is the raw
//! price plus the pool:
//!
//! ```text
//! no dividend:   factor = p[t] / p[t-1]           pool[t] = pool[t-1] * factor
//! dividend d:    factor = p[t] / (p[t-1] - d)     pool[t] = (pool[t-1] + d) * factor
//! total return:  tr[t]  = pool[t] + p[t]
//! ```

use tilt_core::types::{
    Date, DividendSchedule, PriceHistory, PriceObservation, SecurityId, TotalReturnPoint,
    TotalReturnSeries,
};
use tracing::debug;

use super::parallel::maybe_parallel_map;
use crate::error::{PortfolioError, PortfolioResult};
use crate::types::ReturnsConfig;

/// State carried through the reinvestment fold.
struct Reinvestment {
    previous: Option<(Date, f64)>,
    pool: f64,
    points: Vec<TotalReturnPoint>,
}

/// Builds the dividend-reinvested price series of one security.
///
/// The dividend for a day is the observation's own dividend when present,
/// otherwise the schedule's amount for that date, otherwise zero. With no
/// dividends the output equals the raw prices exactly.
///
/// # Errors
///
/// `PortfolioError::Validation` (with security and date) for an empty
/// series, a dividend on the first observation, a non-finite or
/// non-positive price, a negative or non-finite dividend, dates that are not
/// strictly increasing, or a dividend at least as large as the previous
/// close.
pub fn build_total_return(
    security: &SecurityId,
    prices: &[PriceObservation],
    dividends: &DividendSchedule,
) -> PortfolioResult<TotalReturnSeries> {
    if prices.is_empty() {
        return Err(PortfolioError::validation(
            format!("'{security}'"),
            "price series is empty",
        ));
    }

    let state = Reinvestment {
        previous: None,
        pool: 0.0,
        points: Vec::with_capacity(prices.len()),
    };

    let state = prices.iter().try_fold(state, |mut state, obs| {
        let fail = |reason: String| PortfolioError::validation_at(security, obs.date, reason);

        let price = obs.last_price;
        if !price.is_finite() || price <= 0.0 {
            return Err(fail(format!("price must be positive and finite, got {price}")));
        }

        let dividend = obs
            .dividend
            .or_else(|| dividends.get(obs.date))
            .unwrap_or(0.0);
        if !dividend.is_finite() || dividend < 0.0 {
            return Err(fail(format!(
                "dividend must be non-negative and finite, got {dividend}"
            )));
        }

        let pool = match state.previous {
            None => {
                if dividend > 0.0 {
                    return Err(fail("dividend on the first observation".to_string()));
                }
                0.0
            }
            Some((prev_date, prev_price)) => {
                if obs.date <= prev_date {
                    return Err(fail(format!("date does not follow {prev_date}")));
                }
                if dividend > 0.0 {
                    let ex_price = prev_price - dividend;
                    if ex_price <= 0.0 {
                        return Err(fail(format!(
                            "dividend {dividend} is not below previous close {prev_price}"
                        )));
                    }
                    (state.pool + dividend) * (price / ex_price)
                } else {
                    state.pool * (price / prev_price)
                }
            }
        };

        state.points.push(TotalReturnPoint {
            date: obs.date,
            total_return_price: pool + price,
        });
        state.pool = pool;
        state.previous = Some((obs.date, price));
        Ok(state)
    })?;

    debug!(
        security = %security,
        points = state.points.len(),
        pool = state.pool,
        "built total-return series"
    );

    Ok(TotalReturnSeries::new(security.clone(), state.points)?)
}

/// Builds total-return series for many securities.
///
/// Dividends are taken from each history's observations. Output order
/// equals input order. Runs in parallel when the `parallel` feature is
/// enabled and the history count reaches the configured threshold.
///
/// # Errors
///
/// The first error encountered, in input order.
pub fn build_total_returns(
    histories: &[PriceHistory],
    config: &ReturnsConfig,
) -> PortfolioResult<Vec<TotalReturnSeries>> {
    let empty = DividendSchedule::new();
    maybe_parallel_map(histories, config, |h| {
        build_total_return(&h.security, &h.observations, &empty)
    })
    .into_iter()
    .collect()
}

/// Daily fractional returns of a series, `r[t] = (p[t] - p[t-1]) / p[t]`.
///
/// The current-day price is the denominator. The first date has no return
/// and is omitted.
pub fn daily_returns(series: &TotalReturnSeries) -> Vec<(Date, f64)> {
    series
        .points()
        .windows(2)
        .map(|w| {
            let (prev, cur) = (w[0].total_return_price, w[1].total_return_price);
            (w[1].date, (cur - prev) / cur)
        })
        .collect()
}
