//! ABC rejection sampling over the tunable parameters.
//!
//! Each trial perturbs a copy of the parameter set, simulates a
//! trajectory from a random opening price and keeps the copy when the
//! trajectory's distance is under the tolerance. Accepted copies are
//! averaged into the live set. A round with no acceptance leaves the
//! parameters alone and hands back a widened tolerance.

use crate::distance::TrajectoryDistance;
use crate::parameter::{self, Parameter};
use crate::probability::PriceProbabilityModel;
use crate::rng::{RandomSource, StdRandom};
use crate::sampler::FutureTransitionSampler;
use crate::sku::SkuData;
use rayon::prelude::*;
use tracing::debug;

/// Standard deviation of the Gaussian perturbation applied per trial.
pub const PERTURBATION_SD: f64 = 0.1;
/// Factor applied to the tolerance after a round with no acceptance.
pub const TOLERANCE_GROWTH: f64 = 1.1;

/// Base seed for the parallel trials of outer iteration `iteration`.
///
/// Rounds occupy consecutive blocks of `trials` seeds starting one block
/// past `base_seed`, so no trial shares a stream with the caller's own
/// `StdRandom` seeded at `base_seed`.
pub fn round_seed(base_seed: u64, iteration: usize, trials: usize) -> u64 {
    let block = (iteration as u64 + 1).wrapping_mul(trials.max(1) as u64);
    base_seed.wrapping_add(block)
}

/// Result of one refinement round.
#[derive(Debug, Clone)]
pub struct RefinementOutcome {
    /// Accepted proposals, in trial order.
    pub accepted: Vec<Vec<Parameter>>,
    pub trials: usize,
    /// Tolerance for the next round: unchanged if anything was accepted,
    /// otherwise widened by `TOLERANCE_GROWTH`.
    pub tolerance: f64,
}

impl RefinementOutcome {
    pub fn accepted_count(&self) -> usize {
        self.accepted.len()
    }

    pub fn any_accepted(&self) -> bool {
        !self.accepted.is_empty()
    }

    pub fn acceptance_rate(&self) -> f64 {
        if self.trials == 0 {
            0.0
        } else {
            self.accepted.len() as f64 / self.trials as f64
        }
    }
}

pub struct ParameterRefiner<'m, 'a> {
    model: &'m PriceProbabilityModel<'a>,
    pub perturbation_sd: f64,
}

impl<'m, 'a> ParameterRefiner<'m, 'a> {
    pub fn new(model: &'m PriceProbabilityModel<'a>) -> Self {
        ParameterRefiner {
            model,
            perturbation_sd: PERTURBATION_SD,
        }
    }

    /// Copy of `parameters` with each tunable one redrawn from
    /// `Normal(current, perturbation_sd)` and clamped to [0, 1].
    pub fn propose(&self, parameters: &[Parameter], rng: &mut dyn RandomSource) -> Vec<Parameter> {
        let mut proposal = parameters.to_vec();
        for p in proposal.iter_mut().filter(|p| p.is_tunable()) {
            let drawn = rng.normal(p.probability, self.perturbation_sd);
            p.set_probability(drawn);
        }
        proposal
    }

    /// Run one trial; the proposal comes back if it was accepted.
    pub fn run_trial(
        &self,
        parameters: &[Parameter],
        sku: &SkuData,
        days: usize,
        tolerance: f64,
        rng: &mut dyn RandomSource,
    ) -> Option<Vec<Parameter>> {
        let proposal = self.propose(parameters, rng);

        let initial_price = rng.uniform(sku.global_min_price, sku.global_max_price);
        let trajectory =
            FutureTransitionSampler::new(self.model).simulate(sku, days, initial_price, rng);
        let distance =
            TrajectoryDistance::new(self.model).distance(&trajectory, sku, days, rng);

        if distance < tolerance {
            Some(proposal)
        } else {
            None
        }
    }

    /// Sequential refinement round of `trials` trials.
    pub fn refine(
        &self,
        parameters: &mut [Parameter],
        sku: &SkuData,
        days: usize,
        tolerance: f64,
        trials: usize,
        rng: &mut dyn RandomSource,
    ) -> RefinementOutcome {
        let mut accepted = Vec::new();
        for trial in 0..trials {
            if let Some(proposal) = self.run_trial(parameters, sku, days, tolerance, rng) {
                accepted.push(proposal);
            }
            debug!(trial = trial + 1, trials, accepted = accepted.len(), "refinement trial");
        }
        self.finish(parameters, accepted, trials, tolerance)
    }

    /// Refinement round with trials spread over the rayon pool.
    ///
    /// Trial `i` draws from its own `StdRandom` seeded with `seed + i` and
    /// works on its own proposal and price window. Aggregation happens
    /// after every trial has finished.
    pub fn refine_parallel(
        &self,
        parameters: &mut [Parameter],
        sku: &SkuData,
        days: usize,
        tolerance: f64,
        trials: usize,
        seed: u64,
    ) -> RefinementOutcome {
        let snapshot: &[Parameter] = parameters;
        let accepted: Vec<Vec<Parameter>> = (0..trials)
            .into_par_iter()
            .filter_map(|trial| {
                let mut rng = StdRandom::seeded(seed.wrapping_add(trial as u64));
                self.run_trial(snapshot, sku, days, tolerance, &mut rng)
            })
            .collect();
        self.finish(parameters, accepted, trials, tolerance)
    }

    fn finish(
        &self,
        parameters: &mut [Parameter],
        accepted: Vec<Vec<Parameter>>,
        trials: usize,
        tolerance: f64,
    ) -> RefinementOutcome {
        let tolerance = if accepted.is_empty() {
            tolerance * TOLERANCE_GROWTH
        } else {
            aggregate_accepted(parameters, &accepted);
            tolerance
        };
        debug!(
            accepted = accepted.len(),
            trials,
            tolerance,
            "refinement round finished"
        );
        RefinementOutcome {
            accepted,
            trials,
            tolerance,
        }
    }
}

/// Set each tunable parameter to its mean over `accepted`, then normalize
/// the tunable subset to sum to 1. No-op when `accepted` is empty.
pub fn aggregate_accepted(parameters: &mut [Parameter], accepted: &[Vec<Parameter>]) {
    if accepted.is_empty() {
        return;
    }
    let n = accepted.len() as f64;
    for (i, p) in parameters.iter_mut().enumerate() {
        if !p.is_tunable() {
            continue;
        }
        let sum: f64 = accepted
            .iter()
            .filter_map(|proposal| proposal.get(i))
            .map(|q| q.probability)
            .sum();
        p.set_probability(sum / n);
    }
    parameter::normalize_tunable(parameters);
}
