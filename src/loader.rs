//! Input file loaders and the per-SKU directory layout.
//!
//! Inputs for one SKU and snapshot date live under
//! `<input_dir>/sku_<sku>/<date>/`, outputs under
//! `<output_dir>/sku_<sku>/<date>/`.

use crate::error::{ForecastError, Result};
use crate::history::{HistoricalData, HistoricalRecord};
use crate::sku::{PriceInterval, SkuData};
use crate::zscore::FeatureStats;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const INTERVAL_COLUMN: &str = "list_products_";

/// File locations for one SKU on one snapshot date.
#[derive(Debug, Clone)]
pub struct SkuPaths {
    pub sku: String,
    pub date: String,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl SkuPaths {
    pub fn new(input_root: &Path, output_root: &Path, sku: &str, date: &str) -> Self {
        let leaf = PathBuf::from(format!("sku_{}", sku)).join(date);
        SkuPaths {
            sku: sku.to_string(),
            date: date.to_string(),
            input_dir: input_root.join(&leaf),
            output_dir: output_root.join(&leaf),
        }
    }

    fn input(&self, stem: &str, ext: &str) -> PathBuf {
        self.input_dir
            .join(format!("{}_{}_{}.{}", self.sku, stem, self.date, ext))
    }

    pub fn intervals(&self) -> PathBuf {
        self.input("matriz_intervals_df", "csv")
    }

    pub fn normalized_features(&self) -> PathBuf {
        self.input("df_features_sku_norm", "txt")
    }

    pub fn raw_features(&self) -> PathBuf {
        self.input("df_features_sku", "txt")
    }

    pub fn mean_values(&self) -> PathBuf {
        self.input("mean_values_features_sku", "csv")
    }

    pub fn std_values(&self) -> PathBuf {
        self.input("std_values_features_sku", "csv")
    }

    pub fn historical(&self) -> PathBuf {
        self.input("filtered_df_features_sku", "csv")
    }

    pub fn simulation_log(&self) -> PathBuf {
        self.output_dir
            .join(format!("simulation_log_{}.txt", self.date))
    }

    pub fn statistics(&self) -> PathBuf {
        self.output_dir
            .join(format!("statistics_simulations_{}.csv", self.date))
    }

    pub fn summary(&self) -> PathBuf {
        self.output_dir.join(format!("summary_{}.json", self.date))
    }
}

/// Everything loaded from disk for one SKU run.
#[derive(Debug, Clone)]
pub struct SkuInputs {
    pub sku: SkuData,
    pub history: HistoricalData,
    pub normalized_features: BTreeMap<String, f64>,
    pub raw_features: BTreeMap<String, f64>,
    pub stats: FeatureStats,
}

pub fn load_inputs(paths: &SkuPaths) -> Result<SkuInputs> {
    let sku = load_sku_data(&paths.intervals())?;
    let history = load_historical(&paths.historical())?;
    let normalized_features = load_features(&paths.normalized_features())?;
    let raw_features = load_features(&paths.raw_features())?;
    let stats = FeatureStats::new(
        load_reference_values(&paths.mean_values())?,
        load_reference_values(&paths.std_values())?,
    );
    Ok(SkuInputs {
        sku,
        history,
        normalized_features,
        raw_features,
        stats,
    })
}

/// Parse an interval literal such as `(10.5, 20)`.
pub fn parse_interval(cell: &str) -> Result<PriceInterval> {
    let inner = cell
        .trim()
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| ForecastError::Parse(format!("interval '{}' is not '(min, max)'", cell)))?;
    let mut parts = inner.split(',').map(str::trim);
    let (min, max) = match (parts.next(), parts.next(), parts.next()) {
        (Some(min), Some(max), None) => (min, max),
        _ => {
            return Err(ForecastError::Parse(format!(
                "interval '{}' must have exactly two bounds",
                cell
            )))
        }
    };
    Ok(PriceInterval::new(parse_number(min)?, parse_number(max)?))
}

fn parse_number(s: &str) -> Result<f64> {
    s.trim()
        .parse::<f64>()
        .map_err(|e| ForecastError::Parse(format!("'{}' is not a number: {}", s, e)))
}

/// Load the interval matrix of a SKU.
///
/// `;`-separated: `sku;list_products_0;…;list_products_n;min_price;max_price`
/// header, then one data row. Empty interval cells are skipped.
pub fn load_sku_data(path: &Path) -> Result<SkuData> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_path(path)?;
    let headers = reader.headers()?.clone();
    let row = reader
        .records()
        .next()
        .ok_or_else(|| ForecastError::InvalidInput(format!("{} has no data row", path.display())))??;

    let sku = row.get(0).unwrap_or_default().trim().to_string();

    let mut intervals = Vec::new();
    let mut last_interval_col = 0;
    for (col, name) in headers.iter().enumerate() {
        if !name.contains(INTERVAL_COLUMN) {
            continue;
        }
        last_interval_col = col;
        match row.get(col).map(str::trim) {
            Some(cell) if !cell.is_empty() => intervals.push(parse_interval(cell)?),
            _ => {}
        }
    }

    let bound = |col: usize, label: &str| -> Result<f64> {
        row.get(col)
            .ok_or_else(|| {
                ForecastError::InvalidInput(format!("{} is missing {}", path.display(), label))
            })
            .and_then(parse_number)
    };
    let global_min_price = bound(last_interval_col + 1, "min_price")?;
    let global_max_price = bound(last_interval_col + 2, "max_price")?;

    info!(
        sku = %sku,
        intervals = intervals.len(),
        global_min_price,
        global_max_price,
        "loaded SKU data"
    );
    Ok(SkuData::new(sku, intervals, global_min_price, global_max_price))
}

/// Parse one `name: … (value)` feature line.
pub fn parse_feature_line(line: &str) -> Option<(String, f64)> {
    let (key, value) = line.split_once(':')?;
    let key = key.trim();
    let start = value.find('(')?;
    let end = start + value[start..].find(')')?;
    let number = value[start + 1..end].trim().parse::<f64>().ok()?;
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), number))
}

/// Load a feature text file (normalized or raw).
pub fn load_features(path: &Path) -> Result<BTreeMap<String, f64>> {
    let content = std::fs::read_to_string(path)?;
    let mut features = BTreeMap::new();
    for line in content.lines().filter(|l| !l.trim().is_empty()) {
        match parse_feature_line(line) {
            Some((key, value)) => {
                features.insert(key, value);
            }
            None => warn!(line, file = %path.display(), "skipping unparsable feature line"),
        }
    }
    info!(count = features.len(), file = %path.display(), "loaded features");
    Ok(features)
}

/// Load a mean or std reference CSV: header of feature names, one row of
/// values.
pub fn load_reference_values(path: &Path) -> Result<BTreeMap<String, f64>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let mut values = BTreeMap::new();
    if let Some(row) = reader.records().next() {
        let row = row?;
        for (name, cell) in headers.iter().zip(row.iter()) {
            values.insert(name.trim().to_string(), parse_number(cell)?);
        }
    }
    Ok(values)
}

/// Load the `;`-separated historical feature CSV, one record per row.
/// Empty or non-numeric cells are left out of their record.
pub fn load_historical(path: &Path) -> Result<HistoricalData> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_path(path)?;
    let features: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let record: HistoricalRecord = features
            .iter()
            .zip(row.iter())
            .filter_map(|(name, cell)| cell.trim().parse::<f64>().ok().map(|v| (name.clone(), v)))
            .collect();
        records.push(record);
    }

    if records.is_empty() {
        warn!(file = %path.display(), "no historical data loaded");
    } else {
        info!(records = records.len(), columns = features.len(), "loaded historical data");
    }
    Ok(HistoricalData::new(features, records))
}

/// SKU ids with a `sku_<id>` directory under `input_root`, sorted.
pub fn discover_skus(input_root: &Path) -> Result<Vec<String>> {
    let mut skus = Vec::new();
    for entry in std::fs::read_dir(input_root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Some(id) = entry.file_name().to_str().and_then(|n| n.strip_prefix("sku_")) {
            skus.push(id.to_string());
        }
    }
    skus.sort();
    Ok(skus)
}
