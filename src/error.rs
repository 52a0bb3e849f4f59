//! Error types for the sku-forecast crate.
//!
//! The numeric core never fails; errors only come out of setup, input
//! verification and file I/O.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// A cell, interval literal or date that could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Inputs that fail the pre-run verification.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = std::result::Result<T, ForecastError>;
