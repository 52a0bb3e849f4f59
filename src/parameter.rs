use serde::Serialize;
use std::collections::BTreeMap;

/// Parameters the ABC refiner perturbs and renormalizes. Everything else
/// in a parameter set is carried along untouched.
pub const TUNABLE_PARAMETERS: [&str; 2] = ["total_num_count_products", "total_price_products"];

pub fn is_tunable(name: &str) -> bool {
    TUNABLE_PARAMETERS.contains(&name)
}

/// A named model factor with a probability kept in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub probability: f64,
}

impl Parameter {
    /// Out-of-range (and NaN) probabilities are clamped, not rejected.
    pub fn new(name: impl Into<String>, probability: f64) -> Self {
        Parameter {
            name: name.into(),
            probability: clamp_probability(probability),
        }
    }

    pub fn is_tunable(&self) -> bool {
        is_tunable(&self.name)
    }

    /// Add `adjustment` and clamp back into [0, 1].
    pub fn adjust_probability(&mut self, adjustment: f64) {
        self.probability = clamp_probability(self.probability + adjustment);
    }

    pub fn set_probability(&mut self, probability: f64) {
        self.probability = clamp_probability(probability);
    }
}

pub fn clamp_probability(p: f64) -> f64 {
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 1.0)
    }
}

/// Reset every parameter to 0.5.
pub fn initialize(parameters: &mut [Parameter]) {
    for p in parameters.iter_mut() {
        p.set_probability(0.5);
    }
}

pub fn tunable_sum(parameters: &[Parameter]) -> f64 {
    parameters
        .iter()
        .filter(|p| p.is_tunable())
        .map(|p| p.probability)
        .sum()
}

/// Rescale the tunable subset so it sums to exactly 1.
///
/// A zero total has no direction to preserve, so every tunable parameter
/// gets an equal share instead.
pub fn normalize_tunable(parameters: &mut [Parameter]) {
    let count = parameters.iter().filter(|p| p.is_tunable()).count();
    if count == 0 {
        return;
    }
    let total = tunable_sum(parameters);
    for p in parameters.iter_mut().filter(|p| p.is_tunable()) {
        let share = if total > 0.0 {
            p.probability / total
        } else {
            1.0 / count as f64
        };
        p.set_probability(share);
    }
}

pub fn find<'a>(parameters: &'a [Parameter], name: &str) -> Option<&'a Parameter> {
    parameters.iter().find(|p| p.name == name)
}

/// Build the initial parameter set from a normalized feature map: one
/// parameter per feature, missing tunables added at 0.5, tunable subset
/// normalized.
pub fn from_features(features: &BTreeMap<String, f64>) -> Vec<Parameter> {
    let mut parameters: Vec<Parameter> = features
        .iter()
        .map(|(name, value)| Parameter::new(name.clone(), *value))
        .collect();

    for name in TUNABLE_PARAMETERS {
        if find(&parameters, name).is_none() {
            parameters.push(Parameter::new(name, 0.5));
        }
    }

    normalize_tunable(&mut parameters);
    parameters
}

/// Name -> probability snapshot, in parameter order.
pub fn snapshot(parameters: &[Parameter]) -> Vec<(String, f64)> {
    parameters
        .iter()
        .map(|p| (p.name.clone(), p.probability))
        .collect()
}
