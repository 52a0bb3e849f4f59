use crate::probability::PriceProbabilityModel;
use crate::rng::RandomSource;
use crate::sku::SkuData;

/// Scores a trajectory by how far the model's own probabilities sit from
/// a uniform interval share.
///
/// This is a self-consistency measure, not a fit to observed prices: for
/// each day the model probability of that day's price is compared with
/// `1 / |intervals|`.
pub struct TrajectoryDistance<'m, 'a> {
    model: &'m PriceProbabilityModel<'a>,
}

impl<'m, 'a> TrajectoryDistance<'m, 'a> {
    pub fn new(model: &'m PriceProbabilityModel<'a>) -> Self {
        TrajectoryDistance { model }
    }

    /// Mean absolute gap over the first `days` prices. Lower is better.
    ///
    /// Every day is scored against the completed trajectory as its price
    /// window, the state the sampler leaves behind. A trajectory shorter
    /// than `days` is averaged over the prices it has. Returns 0 when
    /// nothing is scored.
    pub fn distance(
        &self,
        trajectory: &[f64],
        sku: &SkuData,
        days: usize,
        rng: &mut dyn RandomSource,
    ) -> f64 {
        let scored = days.min(trajectory.len());
        if scored == 0 {
            return 0.0;
        }
        let baseline = sku.uniform_probability();
        let total: f64 = trajectory
            .iter()
            .take(scored)
            .enumerate()
            .map(|(day, &price)| {
                let expected = self.model.probability(price, sku, day, trajectory, rng);
                (expected - baseline).abs()
            })
            .sum();
        total / scored as f64
    }
}
