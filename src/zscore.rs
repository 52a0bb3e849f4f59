use std::collections::BTreeMap;

/// Per-feature mean and standard deviation used to move values between
/// raw and z-score scales.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureStats {
    pub mean: BTreeMap<String, f64>,
    pub std: BTreeMap<String, f64>,
}

impl FeatureStats {
    pub fn new(mean: BTreeMap<String, f64>, std: BTreeMap<String, f64>) -> Self {
        FeatureStats { mean, std }
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty() || self.std.is_empty()
    }

    /// z-score of `value` for `feature`; 0 when the feature is unknown or
    /// its standard deviation is 0.
    pub fn normalize(&self, value: f64, feature: &str) -> f64 {
        match (self.mean.get(feature), self.std.get(feature)) {
            (Some(&m), Some(&s)) if s != 0.0 => (value - m) / s,
            _ => 0.0,
        }
    }

    /// Raw value for a z-score, or `None` for an unknown feature.
    pub fn denormalize(&self, z: f64, feature: &str) -> Option<f64> {
        match (self.mean.get(feature), self.std.get(feature)) {
            (Some(&m), Some(&s)) => Some(z * s + m),
            _ => None,
        }
    }

    /// z-score every value in `record` whose feature has stats.
    pub fn z_score(&self, record: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
        record
            .iter()
            .filter(|(k, _)| self.mean.contains_key(*k) && self.std.contains_key(*k))
            .map(|(k, &v)| (k.clone(), self.normalize(v, k)))
            .collect()
    }

    /// Back to the raw scale; features without stats are dropped.
    pub fn inverse_z_score(&self, normalized: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
        normalized
            .iter()
            .filter_map(|(k, &z)| self.denormalize(z, k).map(|v| (k.clone(), v)))
            .collect()
    }
}
