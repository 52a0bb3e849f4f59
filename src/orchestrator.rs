use crate::config::SimulationConfig;
use crate::distance::TrajectoryDistance;
use crate::error::Result;
use crate::history::{verify_input_data, HistoricalData};
use crate::parameter::{self, Parameter};
use crate::probability::PriceProbabilityModel;
use crate::refiner::{round_seed, ParameterRefiner};
use crate::rng::{RandomSource, StdRandom};
use crate::sampler::FutureTransitionSampler;
use crate::sku::SkuData;
use crate::zscore::FeatureStats;

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Per-iteration statistics snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct IterationRecord {
    /// 1-based iteration index.
    pub iteration: usize,
    pub initial_price: f64,
    pub average_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub distance: f64,
    /// Tolerance in force after this iteration's refinement round.
    pub tolerance: f64,
    /// `distance <= tolerance`.
    pub accepted: bool,
    pub refinement_accepted: usize,
    pub parameters: Vec<(String, f64)>,
}

/// Everything a run produces.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub sku: String,
    pub days_to_simulate: usize,
    pub iterations: Vec<IterationRecord>,
    pub best_trajectory: Vec<f64>,
    pub best_distance: f64,
    pub best_iteration: Option<usize>,
    /// How many times the best trajectory was replaced.
    pub best_improvements: usize,
    pub accepted_simulations: usize,
    pub rejected_simulations: usize,
    /// Mean simulated price per day across all iterations.
    pub average_prices: Vec<f64>,
    pub initial_parameters: Vec<Parameter>,
    pub final_parameters: Vec<Parameter>,
    /// Final parameters mapped back to the raw feature scale.
    pub denormalized_parameters: BTreeMap<String, f64>,
    /// Raw feature values of the snapshot, for comparison with the
    /// denormalized parameters.
    pub raw_features: BTreeMap<String, f64>,
    pub final_tolerance: f64,
}

/// Outer refinement/simulation loop for one SKU.
pub struct SimulationOrchestrator {
    pub config: SimulationConfig,
    pub sku: SkuData,
    pub history: HistoricalData,
    pub stats: FeatureStats,
    pub parameters: Vec<Parameter>,
    pub raw_features: BTreeMap<String, f64>,
}

impl SimulationOrchestrator {
    /// Verify inputs and build the initial parameter set from the
    /// normalized feature map.
    pub fn new(
        config: SimulationConfig,
        sku: SkuData,
        history: HistoricalData,
        normalized_features: &BTreeMap<String, f64>,
        stats: FeatureStats,
    ) -> Result<Self> {
        config.validate()?;
        verify_input_data(&history, &sku)?;
        let parameters = parameter::from_features(normalized_features);
        Ok(SimulationOrchestrator {
            config,
            sku,
            history,
            stats,
            parameters,
            raw_features: BTreeMap::new(),
        })
    }

    /// Replace the parameter set; the tunable subset is renormalized.
    pub fn with_parameters(mut self, parameters: Vec<Parameter>) -> Self {
        self.parameters = parameters;
        parameter::normalize_tunable(&mut self.parameters);
        self
    }

    /// Attach the snapshot's raw feature values to the report.
    pub fn with_raw_features(mut self, raw_features: BTreeMap<String, f64>) -> Self {
        self.raw_features = raw_features;
        self
    }

    pub fn run(&mut self) -> SimulationReport {
        let mut rng = StdRandom::new(self.config.seed);
        self.run_with(&mut rng, |_| {})
    }

    /// Run every configured iteration, calling `observer` after each.
    ///
    /// All iterations execute even once a trajectory lands within
    /// tolerance; acceptance is only recorded.
    pub fn run_with<F>(&mut self, rng: &mut dyn RandomSource, mut observer: F) -> SimulationReport
    where
        F: FnMut(&IterationRecord),
    {
        let days = self.config.days_to_simulate;
        let iterations = self.config.number_of_iterations;
        let trials = self.config.number_of_refinement_trials;
        let base_seed = self.config.seed.unwrap_or_else(rand::random);

        let model = PriceProbabilityModel::new(&self.history);
        let refiner = ParameterRefiner::new(&model);
        let sampler = FutureTransitionSampler::new(&model);
        let scorer = TrajectoryDistance::new(&model);

        info!(
            sku = %self.sku.sku,
            iterations,
            days,
            trials,
            tolerance = self.config.tolerance,
            "starting simulation"
        );

        let initial_parameters = self.parameters.clone();
        let mut tolerance = self.config.tolerance;
        let mut records = Vec::with_capacity(iterations);
        let mut best_trajectory = Vec::new();
        let mut best_distance = f64::INFINITY;
        let mut best_iteration = None;
        let mut best_improvements = 0;
        let mut accepted_simulations = 0;
        let mut rejected_simulations = 0;
        let mut day_sums = vec![0.0; days];

        for i in 0..iterations {
            let outcome = if self.config.parallel_trials {
                refiner.refine_parallel(
                    &mut self.parameters,
                    &self.sku,
                    days,
                    tolerance,
                    trials,
                    round_seed(base_seed, i, trials),
                )
            } else {
                refiner.refine(&mut self.parameters, &self.sku, days, tolerance, trials, rng)
            };
            tolerance = outcome.tolerance;

            let initial_price = rng.uniform(self.sku.global_min_price, self.sku.global_max_price);
            let trajectory = sampler.simulate(&self.sku, days, initial_price, rng);
            let distance = scorer.distance(&trajectory, &self.sku, days, rng);

            let average_price = trajectory.iter().sum::<f64>() / days as f64;
            let min_price = trajectory.iter().cloned().fold(f64::INFINITY, f64::min);
            let max_price = trajectory.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

            if distance < best_distance {
                best_distance = distance;
                best_trajectory = trajectory.clone();
                best_iteration = Some(i + 1);
                best_improvements += 1;
                debug!(iteration = i + 1, distance, "new best simulation");
            }

            let accepted = distance <= tolerance;
            if accepted {
                accepted_simulations += 1;
            } else {
                rejected_simulations += 1;
            }

            for (sum, price) in day_sums.iter_mut().zip(&trajectory) {
                *sum += price;
            }

            let record = IterationRecord {
                iteration: i + 1,
                initial_price,
                average_price,
                min_price,
                max_price,
                distance,
                tolerance,
                accepted,
                refinement_accepted: outcome.accepted_count(),
                parameters: parameter::snapshot(&self.parameters),
            };
            debug!(
                iteration = record.iteration,
                initial_price,
                average_price,
                min_price,
                max_price,
                distance,
                tolerance,
                accepted,
                "iteration complete"
            );
            observer(&record);
            records.push(record);
        }

        let average_prices = day_sums.iter().map(|s| s / iterations as f64).collect();

        let normalized: BTreeMap<String, f64> = self
            .parameters
            .iter()
            .map(|p| (p.name.clone(), p.probability))
            .collect();
        let denormalized_parameters = self.stats.inverse_z_score(&normalized);

        info!(
            sku = %self.sku.sku,
            best_distance,
            accepted_simulations,
            rejected_simulations,
            final_tolerance = tolerance,
            "simulation finished"
        );

        SimulationReport {
            sku: self.sku.sku.clone(),
            days_to_simulate: days,
            iterations: records,
            best_trajectory,
            best_distance,
            best_iteration,
            best_improvements,
            accepted_simulations,
            rejected_simulations,
            average_prices,
            initial_parameters,
            final_parameters: self.parameters.clone(),
            denormalized_parameters,
            raw_features: self.raw_features.clone(),
            final_tolerance: tolerance,
        }
    }
}
