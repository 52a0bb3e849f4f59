//! Historical feature records for one SKU and date.
//!
//! Records are chronological; `total_price_products` is the price series
//! the trend and volatility calculators read.

use crate::error::{ForecastError, Result};
use crate::sku::SkuData;
use std::collections::BTreeMap;
use tracing::warn;

pub const PRICE_FEATURE: &str = "total_price_products";

/// One day's feature values, keyed by feature name.
pub type HistoricalRecord = BTreeMap<String, f64>;

#[derive(Debug, Clone, Default)]
pub struct HistoricalData {
    /// Column names in file order.
    pub features: Vec<String>,
    pub records: Vec<HistoricalRecord>,
}

impl HistoricalData {
    pub fn new(features: Vec<String>, records: Vec<HistoricalRecord>) -> Self {
        HistoricalData { features, records }
    }

    /// Build from a plain price series, one record per price.
    pub fn from_prices(prices: &[f64]) -> Self {
        let records = prices
            .iter()
            .map(|&p| {
                let mut r = HistoricalRecord::new();
                r.insert(PRICE_FEATURE.to_string(), p);
                r
            })
            .collect();
        HistoricalData::new(vec![PRICE_FEATURE.to_string()], records)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Chronological `total_price_products` values, skipping records
    /// that lack the column.
    pub fn prices(&self) -> Vec<f64> {
        self.records
            .iter()
            .filter_map(|r| r.get(PRICE_FEATURE).copied())
            .collect()
    }

    pub fn has_price_column(&self) -> bool {
        self.records
            .first()
            .map(|r| r.contains_key(PRICE_FEATURE))
            .unwrap_or(false)
    }
}

/// Refuse to run on empty history, an empty interval list, intervals
/// outside the SKU's global price range, or history without a price
/// column. Warns (but passes) on a suspicious price range.
pub fn verify_input_data(history: &HistoricalData, sku: &SkuData) -> Result<()> {
    if history.is_empty() {
        return Err(ForecastError::InvalidInput(
            "historical data is empty".to_string(),
        ));
    }
    if sku.intervals.is_empty() {
        return Err(ForecastError::InvalidInput(format!(
            "SKU {} product list is empty",
            sku.sku
        )));
    }
    sku.validate()?;
    if !history.has_price_column() {
        return Err(ForecastError::InvalidInput(format!(
            "'{}' not found in historical data; available columns: {}",
            PRICE_FEATURE,
            history.features.join(", ")
        )));
    }

    let prices = history.prices();
    let min = prices.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = prices.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if min <= 0.0 || max > 1e6 {
        warn!(min, max, "suspicious price range in historical data");
    }

    Ok(())
}
