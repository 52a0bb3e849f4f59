use approx::assert_relative_eq;
use sku_forecast::analytics::*;
use sku_forecast::history::HistoricalData;
use sku_forecast::rng::StdRandom;

// ─── Trend ───

#[test]
fn test_trend_reads_newest_first() {
    // Rising chronological series is a falling one newest-first
    let history = HistoricalData::from_prices(&[1.0, 2.0, 3.0]);
    // slope -1, min 1, range 2 -> (-1 - 1) / 2
    assert_relative_eq!(historical_trend(&history), -1.0, epsilon = 1e-12);
}

#[test]
fn test_trend_flat_or_short_history_is_zero() {
    assert_eq!(historical_trend(&HistoricalData::from_prices(&[5.0, 5.0, 5.0])), 0.0);
    assert_eq!(historical_trend(&HistoricalData::from_prices(&[5.0])), 0.0);
    assert_eq!(historical_trend(&HistoricalData::default()), 0.0);
}

#[test]
fn test_trend_only_uses_recent_window() {
    // Old noisy prices beyond the window must not move the result
    let mut prices: Vec<f64> = (0..50).map(|i| if i % 2 == 0 { 1000.0 } else { 1.0 }).collect();
    let recent: Vec<f64> = (0..TREND_WINDOW).map(|i| 10.0 + i as f64).collect();
    prices.extend(&recent);

    let windowed = historical_trend(&HistoricalData::from_prices(&prices));
    let only_recent = historical_trend(&HistoricalData::from_prices(&recent));
    assert_relative_eq!(windowed, only_recent, epsilon = 1e-12);
}

#[test]
fn test_ols_slope() {
    assert_relative_eq!(ols_slope(&[1.0, 3.0, 5.0]), 2.0, epsilon = 1e-12);
    assert_eq!(ols_slope(&[4.0]), 0.0);
}

// ─── Seasonality ───

#[test]
fn test_seasonality_is_annual() {
    for day in [0, 17, 89, 90, 150, 200, 300, 364] {
        assert_relative_eq!(seasonality(day), seasonality(day + 365), epsilon = 1e-12);
    }
}

#[test]
fn test_seasonality_quarter_values() {
    assert_eq!(seasonality(0), 0.0);
    assert_relative_eq!(seasonality(45), 0.05 * (std::f64::consts::PI / 4.0).sin(), epsilon = 1e-12);
    assert_relative_eq!(seasonality(135), 0.1 * (std::f64::consts::PI / 4.0).sin(), epsilon = 1e-12);
    assert!(seasonality(225) < 0.0);
    assert!(seasonality(315) < 0.0);
}

// ─── External factor ───

#[test]
fn test_external_events_fixed() {
    let mut rng = StdRandom::seeded(1);
    assert_relative_eq!(external_factor(30, &mut rng), 0.05);
    assert_relative_eq!(external_factor(90, &mut rng), -0.03);
    assert_relative_eq!(external_factor(180, &mut rng), 0.07);
    assert_relative_eq!(external_factor(270, &mut rng), -0.05);
    // Wraps by day of year
    assert_relative_eq!(external_factor(30 + 365, &mut rng), 0.05);
}

#[test]
fn test_external_jitter_bounded() {
    let mut rng = StdRandom::seeded(7);
    for day in 1..29 {
        let f = external_factor(day, &mut rng);
        assert!(f >= -EXTERNAL_JITTER && f < EXTERNAL_JITTER, "day {} jitter {}", day, f);
    }
}

// ─── Autocorrelation ───

#[test]
fn test_autocorrelation_guards() {
    assert_eq!(autocorrelation(&[]), 0.0);
    assert_eq!(autocorrelation(&[12.0]), 0.0);
    assert_eq!(autocorrelation(&[5.0, 5.0, 5.0]), 0.0);
}

#[test]
fn test_autocorrelation_linear_series() {
    // mean 2.5; variance 2.75/3, covariance 1.25/3
    assert_relative_eq!(autocorrelation(&[1.0, 2.0, 3.0, 4.0]), 1.25 / 2.75, epsilon = 1e-12);
}

// ─── Volatility ───

#[test]
fn test_volatility_annualized() {
    // returns +0.1, -0.1 -> population std 0.1
    let history = HistoricalData::from_prices(&[100.0, 110.0, 99.0]);
    assert_relative_eq!(volatility(&history), 0.1 * 252f64.sqrt(), epsilon = 1e-9);
}

#[test]
fn test_volatility_guards() {
    assert_eq!(volatility(&HistoricalData::from_prices(&[10.0])), 0.0);
    assert_eq!(volatility(&HistoricalData::from_prices(&[10.0, 10.0, 10.0])), 0.0);
    // Zero previous price produces no return
    assert_eq!(volatility(&HistoricalData::from_prices(&[0.0, 10.0])), 0.0);
}
