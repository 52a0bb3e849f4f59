use crate::error::{ForecastError, Result};
use serde::Serialize;

/// A closed price band `[min_price, max_price]` observed for a SKU.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceInterval {
    pub min_price: f64,
    pub max_price: f64,
    pub count: Option<u64>,
}

impl PriceInterval {
    pub fn new(min_price: f64, max_price: f64) -> Self {
        PriceInterval {
            min_price,
            max_price,
            count: None,
        }
    }

    pub fn contains(&self, price: f64) -> bool {
        price >= self.min_price && price <= self.max_price
    }

    pub fn midpoint(&self) -> f64 {
        (self.min_price + self.max_price) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.max_price - self.min_price
    }

    /// Fractional position of `price` inside the interval; 0 for a
    /// zero-width interval.
    pub fn position_of(&self, price: f64) -> f64 {
        let width = self.width();
        if width > 0.0 {
            (price - self.min_price) / width
        } else {
            0.0
        }
    }
}

/// A SKU's price intervals together with its global price bounds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkuData {
    pub sku: String,
    pub intervals: Vec<PriceInterval>,
    pub global_min_price: f64,
    pub global_max_price: f64,
}

impl SkuData {
    pub fn new(
        sku: impl Into<String>,
        intervals: Vec<PriceInterval>,
        global_min_price: f64,
        global_max_price: f64,
    ) -> Self {
        SkuData {
            sku: sku.into(),
            intervals,
            global_min_price,
            global_max_price,
        }
    }

    /// Build from intervals alone, deriving the global bounds.
    pub fn from_intervals(sku: impl Into<String>, intervals: Vec<PriceInterval>) -> Self {
        let min = intervals
            .iter()
            .map(|i| i.min_price)
            .fold(f64::INFINITY, f64::min);
        let max = intervals
            .iter()
            .map(|i| i.max_price)
            .fold(f64::NEG_INFINITY, f64::max);
        let (min, max) = if intervals.is_empty() { (0.0, 0.0) } else { (min, max) };
        SkuData::new(sku, intervals, min, max)
    }

    /// Probability every interval would get under a uniform assumption.
    pub fn uniform_probability(&self) -> f64 {
        if self.intervals.is_empty() {
            0.0
        } else {
            1.0 / self.intervals.len() as f64
        }
    }

    /// First interval containing `price`, in insertion order.
    pub fn interval_for(&self, price: f64) -> Option<&PriceInterval> {
        self.intervals.iter().find(|i| i.contains(price))
    }

    /// Check the global bounds enclose every interval.
    pub fn validate(&self) -> Result<()> {
        if self.intervals.is_empty() {
            return Err(ForecastError::InvalidInput(format!(
                "SKU {} has no price intervals",
                self.sku
            )));
        }
        for (i, interval) in self.intervals.iter().enumerate() {
            if interval.min_price > interval.max_price {
                return Err(ForecastError::InvalidInput(format!(
                    "SKU {} interval {} has min {} above max {}",
                    self.sku, i, interval.min_price, interval.max_price
                )));
            }
            if interval.min_price < self.global_min_price
                || interval.max_price > self.global_max_price
            {
                return Err(ForecastError::InvalidInput(format!(
                    "SKU {} interval {} ({}, {}) lies outside global range [{}, {}]",
                    self.sku,
                    i,
                    interval.min_price,
                    interval.max_price,
                    self.global_min_price,
                    self.global_max_price
                )));
            }
        }
        Ok(())
    }
}
