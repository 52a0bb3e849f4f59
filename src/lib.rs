pub mod analytics;
pub mod config;
pub mod distance;
pub mod error;
pub mod history;
pub mod loader;
pub mod orchestrator;
pub mod output;
pub mod parameter;
pub mod probability;
pub mod refiner;
pub mod rng;
pub mod sampler;
pub mod sku;
pub mod zscore;

pub use error::{ForecastError, Result};
