use rand::distributions::WeightedIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

/// Source of every random draw the model makes. Tests substitute a
/// scripted implementation to pin sequences.
pub trait RandomSource {
    /// Uniform draw from `[lo, hi)`; returns `lo` when the range is empty.
    fn uniform(&mut self, lo: f64, hi: f64) -> f64;

    /// Normal draw; a non-positive or non-finite `sd` yields `mean`.
    fn normal(&mut self, mean: f64, sd: f64) -> f64;

    /// Index drawn proportionally to `weights`.
    ///
    /// All-zero (or otherwise unusable) weights fall back to a uniform
    /// draw over the indices. Empty `weights` returns 0.
    fn categorical(&mut self, weights: &[f64]) -> usize;
}

/// `StdRng`-backed random source.
pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(s) => Self::seeded(s),
            None => StdRandom {
                rng: StdRng::from_entropy(),
            },
        }
    }

    pub fn seeded(seed: u64) -> Self {
        StdRandom {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for StdRandom {
    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        if hi - lo <= 0.0 || !(hi - lo).is_finite() {
            return lo;
        }
        self.rng.gen_range(lo..hi)
    }

    fn normal(&mut self, mean: f64, sd: f64) -> f64 {
        if !(sd > 0.0 && sd.is_finite()) {
            return mean;
        }
        match Normal::new(mean, sd) {
            Ok(dist) => dist.sample(&mut self.rng),
            Err(_) => mean,
        }
    }

    fn categorical(&mut self, weights: &[f64]) -> usize {
        if weights.is_empty() {
            return 0;
        }
        match WeightedIndex::new(weights) {
            Ok(dist) => dist.sample(&mut self.rng),
            Err(_) => self.rng.gen_range(0..weights.len()),
        }
    }
}
