//! Feature signals feeding the price probability model.
//!
//! Everything here is a pure function of its inputs except
//! [`external_factor`], which adds jitter on days without a calendar event.

use crate::history::{HistoricalData, PRICE_FEATURE};
use crate::rng::RandomSource;
use std::f64::consts::PI;

/// Records considered by the trend regression.
pub const TREND_WINDOW: usize = 30;
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
pub const DAYS_PER_YEAR: usize = 365;

/// Calendar events as (day of year, effect).
pub const EXTERNAL_EVENTS: [(usize, f64); 4] =
    [(30, 0.05), (90, -0.03), (180, 0.07), (270, -0.05)];
pub const EXTERNAL_JITTER: f64 = 0.01;

/// Slope of the most recent prices, rescaled by their range.
///
/// Takes the last `TREND_WINDOW` records (newest first, records without a
/// price skipped), fits an OLS slope against the position in that list,
/// and returns `(slope - min) / (max - min)`. The result is not bounded to
/// [0, 1]. Fewer than two prices or a flat range give 0.
pub fn historical_trend(history: &HistoricalData) -> f64 {
    let recent: Vec<f64> = history
        .records
        .iter()
        .rev()
        .take(TREND_WINDOW)
        .filter_map(|r| r.get(PRICE_FEATURE).copied())
        .collect();

    if recent.len() < 2 {
        return 0.0;
    }

    let slope = ols_slope(&recent);

    let max = recent.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let min = recent.iter().cloned().fold(f64::INFINITY, f64::min);
    let range = max - min;
    if range == 0.0 || !slope.is_finite() {
        return 0.0;
    }
    (slope - min) / range
}

/// Ordinary least squares slope of `values` against their index.
pub fn ols_slope(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if values.len() < 2 {
        return 0.0;
    }
    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_x2) = (0.0, 0.0, 0.0, 0.0);
    for (i, &y) in values.iter().enumerate() {
        let x = i as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_x2 += x * x;
    }
    let denom = n * sum_x2 - sum_x * sum_x;
    if denom == 0.0 {
        return 0.0;
    }
    (n * sum_xy - sum_x * sum_y) / denom
}

/// Annual half-sine pattern split into four 90-day quarters.
pub fn seasonality(day: usize) -> f64 {
    let d = (day % DAYS_PER_YEAR) as f64;
    if d < 90.0 {
        0.05 * (PI * d / 180.0).sin()
    } else if d < 180.0 {
        0.1 * (PI * (d - 90.0) / 180.0).sin()
    } else if d < 270.0 {
        -0.05 * (PI * (d - 180.0) / 180.0).sin()
    } else {
        -0.1 * (PI * (d - 270.0) / 180.0).sin()
    }
}

/// Effect of a calendar event on `day`, or uniform jitter in
/// `[-EXTERNAL_JITTER, EXTERNAL_JITTER)` when nothing is scheduled.
pub fn external_factor(day: usize, rng: &mut dyn RandomSource) -> f64 {
    let day_of_year = day % DAYS_PER_YEAR;
    match EXTERNAL_EVENTS.iter().find(|(d, _)| *d == day_of_year) {
        Some(&(_, effect)) => effect,
        None => rng.uniform(-EXTERNAL_JITTER, EXTERNAL_JITTER),
    }
}

/// Lag-1 autocorrelation of the simulated prices so far.
///
/// Deviations are taken from the mean of the whole window; both sums
/// run over the first `n - 1` points. Zero variance gives 0.
pub fn autocorrelation(previous_prices: &[f64]) -> f64 {
    let n = previous_prices.len();
    if n < 2 {
        return 0.0;
    }
    let lag = 1;
    let mean = previous_prices.iter().sum::<f64>() / n as f64;

    let mut variance = 0.0;
    let mut covariance = 0.0;
    for i in 0..n - lag {
        let d1 = previous_prices[i] - mean;
        let d2 = previous_prices[i + lag] - mean;
        variance += d1 * d1;
        covariance += d1 * d2;
    }
    let m = (n - lag) as f64;
    variance /= m;
    covariance /= m;

    if variance == 0.0 {
        0.0
    } else {
        covariance / variance
    }
}

/// Annualized standard deviation of day-over-day price returns.
///
/// Only consecutive records that both carry a price (and a non-zero
/// previous price) produce a return.
pub fn volatility(history: &HistoricalData) -> f64 {
    if history.len() < 2 {
        return 0.0;
    }
    let key = PRICE_FEATURE;
    let returns: Vec<f64> = history
        .records
        .windows(2)
        .filter_map(|w| match (w[0].get(key), w[1].get(key)) {
            (Some(&prev), Some(&curr)) if prev != 0.0 => Some((curr - prev) / prev),
            _ => None,
        })
        .collect();

    if returns.is_empty() {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let sq_sum: f64 = returns.iter().map(|r| r * r).sum();
    let variance = (sq_sum / n - mean * mean).max(0.0);
    let stdev = variance.sqrt();

    if !stdev.is_finite() {
        return 0.0;
    }
    stdev * TRADING_DAYS_PER_YEAR.sqrt()
}
