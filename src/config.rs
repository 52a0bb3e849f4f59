use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Configuration for a simulation run, loaded from TOML.
///
/// Every field has a default, so a config file only needs the keys it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub sku: String,
    /// Snapshot date selecting the input directory (YYYY-MM-DD).
    pub day_for_simulate: String,
    pub number_of_iterations: usize,
    /// ABC trials per outer iteration.
    pub number_of_refinement_trials: usize,
    pub days_to_simulate: usize,
    /// Initial acceptance tolerance. Negative values reject everything.
    pub tolerance: f64,
    /// Seed for reproducible runs; `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Spread refinement trials over the rayon pool.
    pub parallel_trials: bool,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            sku: String::new(),
            day_for_simulate: String::new(),
            number_of_iterations: 10,
            number_of_refinement_trials: 10,
            days_to_simulate: 30,
            tolerance: 0.5,
            seed: None,
            parallel_trials: false,
            input_dir: PathBuf::from("data/input"),
            output_dir: PathBuf::from("data/output"),
        }
    }
}

impl SimulationConfig {
    pub fn from_toml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Reject settings the run loop cannot execute.
    pub fn validate(&self) -> Result<()> {
        if self.number_of_iterations == 0 {
            return Err(ForecastError::InvalidParameter(
                "number_of_iterations must be at least 1".to_string(),
            ));
        }
        if self.days_to_simulate == 0 {
            return Err(ForecastError::InvalidParameter(
                "days_to_simulate must be at least 1".to_string(),
            ));
        }
        if !self.tolerance.is_finite() {
            return Err(ForecastError::InvalidParameter(format!(
                "tolerance must be finite, got {}",
                self.tolerance
            )));
        }
        if !self.day_for_simulate.is_empty() {
            self.simulation_date()?;
        }
        Ok(())
    }

    pub fn simulation_date(&self) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(&self.day_for_simulate, DATE_FORMAT).map_err(|e| {
            ForecastError::Parse(format!(
                "day_for_simulate '{}' is not YYYY-MM-DD: {}",
                self.day_for_simulate, e
            ))
        })
    }
}
