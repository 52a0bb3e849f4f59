//! Multiplicative price probability model.
//!
//! A price's probability starts at the uniform interval share and is
//! scaled by its centeredness in the interval, a day decay, and the
//! feature signals from [`crate::analytics`]. The product is clamped to
//! [0, 1]; prices outside every interval score exactly 0.

use crate::analytics;
use crate::history::HistoricalData;
use crate::rng::RandomSource;
use crate::sku::SkuData;
use serde::Serialize;
use tracing::trace;

/// Daily decay rate of the day adjustment.
pub const DAY_DECAY: f64 = 0.05;
/// Width of the centeredness bump, as the divisor of the squared offset.
pub const CENTER_SPREAD: f64 = 0.25;

/// Every factor that went into one probability evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct ProbabilityBreakdown {
    pub interval_index: usize,
    pub base: f64,
    pub interval_adjustment: f64,
    pub day_adjustment: f64,
    pub trend: f64,
    pub seasonality: f64,
    pub external_factor: f64,
    pub autocorrelation: f64,
    pub volatility: f64,
    pub previous_price: f64,
    pub volatility_adjustment: f64,
    pub probability: f64,
}

/// Probability model bound to one SKU's history.
///
/// Trend and volatility depend only on the history, so they are computed
/// once here instead of on every evaluation.
#[derive(Debug, Clone)]
pub struct PriceProbabilityModel<'a> {
    history: &'a HistoricalData,
    trend: f64,
    volatility: f64,
}

impl<'a> PriceProbabilityModel<'a> {
    pub fn new(history: &'a HistoricalData) -> Self {
        PriceProbabilityModel {
            history,
            trend: analytics::historical_trend(history),
            volatility: analytics::volatility(history),
        }
    }

    pub fn history(&self) -> &HistoricalData {
        self.history
    }

    pub fn trend(&self) -> f64 {
        self.trend
    }

    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    /// Probability of `price` on `day`, tracing each factor.
    ///
    /// `window` holds the prices simulated so far in the current
    /// trajectory; its last entry is the previous price.
    pub fn probability(
        &self,
        price: f64,
        sku: &SkuData,
        day: usize,
        window: &[f64],
        rng: &mut dyn RandomSource,
    ) -> f64 {
        match self.breakdown(price, sku, day, window, rng) {
            Some(b) => {
                trace!(
                    sku = %sku.sku,
                    day,
                    price,
                    interval = b.interval_index,
                    base = b.base,
                    interval_adjustment = b.interval_adjustment,
                    day_adjustment = b.day_adjustment,
                    trend_adjustment = 1.0 + b.trend,
                    seasonality_adjustment = 1.0 + b.seasonality,
                    external_adjustment = 1.0 + b.external_factor,
                    autocorrelation_adjustment = 1.0 + b.autocorrelation,
                    volatility = b.volatility,
                    previous_price = b.previous_price,
                    probability = b.probability,
                    "price probability"
                );
                b.probability
            }
            None => {
                trace!(sku = %sku.sku, day, price, "price outside every interval");
                0.0
            }
        }
    }

    /// Same value as [`Self::probability`] without any tracing.
    pub fn probability_quiet(
        &self,
        price: f64,
        sku: &SkuData,
        day: usize,
        window: &[f64],
        rng: &mut dyn RandomSource,
    ) -> f64 {
        self.breakdown(price, sku, day, window, rng)
            .map(|b| b.probability)
            .unwrap_or(0.0)
    }

    /// Full factor breakdown, or `None` when no interval contains `price`.
    pub fn breakdown(
        &self,
        price: f64,
        sku: &SkuData,
        day: usize,
        window: &[f64],
        rng: &mut dyn RandomSource,
    ) -> Option<ProbabilityBreakdown> {
        let (interval_index, interval) = sku
            .intervals
            .iter()
            .enumerate()
            .find(|(_, i)| i.contains(price))?;

        let base = sku.uniform_probability();
        let mut probability = base;

        let position = interval.position_of(price);
        let interval_adjustment = (-(position - 0.5).powi(2) / CENTER_SPREAD).exp();
        probability *= interval_adjustment;

        let day_adjustment = (-DAY_DECAY * day as f64).exp();
        probability *= day_adjustment;

        probability *= 1.0 + self.trend;

        let seasonality = analytics::seasonality(day);
        probability *= 1.0 + seasonality;

        let external_factor = analytics::external_factor(day, rng);
        probability *= 1.0 + external_factor;

        let autocorrelation = analytics::autocorrelation(window);
        probability *= 1.0 + autocorrelation;

        let previous_price = window.last().copied().unwrap_or(price);
        let volatility_adjustment = (-self.volatility * (price - previous_price).abs()).exp();
        probability *= volatility_adjustment;

        let probability = if probability.is_finite() {
            probability.clamp(0.0, 1.0)
        } else {
            0.0
        };

        Some(ProbabilityBreakdown {
            interval_index,
            base,
            interval_adjustment,
            day_adjustment,
            trend: self.trend,
            seasonality,
            external_factor,
            autocorrelation,
            volatility: self.volatility,
            previous_price,
            volatility_adjustment,
            probability,
        })
    }
}

/// One cell of a sensitivity grid.
#[derive(Debug, Clone, Serialize)]
pub struct SensitivityPoint {
    pub price: f64,
    pub day: usize,
    pub probability: f64,
}

pub const SENSITIVITY_PRICES: [f64; 5] = [1000.0, 2000.0, 3000.0, 4000.0, 5000.0];
pub const SENSITIVITY_DAYS: [usize; 5] = [1, 30, 90, 180, 365];

/// Evaluate the model over a price x day grid with an empty window.
pub fn sensitivity_analysis(
    model: &PriceProbabilityModel,
    sku: &SkuData,
    prices: &[f64],
    days: &[usize],
    rng: &mut dyn RandomSource,
) -> Vec<SensitivityPoint> {
    let mut grid = Vec::with_capacity(prices.len() * days.len());
    for &price in prices {
        for &day in days {
            grid.push(SensitivityPoint {
                price,
                day,
                probability: model.probability_quiet(price, sku, day, &[], rng),
            });
        }
    }
    grid
}
