use crate::probability::PriceProbabilityModel;
use crate::rng::RandomSource;
use crate::sku::SkuData;
use tracing::debug;

/// Prices simulated so far in one trajectory.
///
/// Each `simulate` call builds a fresh window, so autocorrelation and the
/// volatility penalty only ever see the trajectory being drawn.
#[derive(Debug, Clone, Default)]
pub struct PriceWindow {
    prices: Vec<f64>,
}

impl PriceWindow {
    pub fn starting_at(initial_price: f64) -> Self {
        PriceWindow {
            prices: vec![initial_price],
        }
    }

    pub fn push(&mut self, price: f64) {
        self.prices.push(price);
    }

    pub fn last(&self) -> Option<f64> {
        self.prices.last().copied()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.prices
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// Draws day-by-day future prices from a SKU's intervals.
pub struct FutureTransitionSampler<'m, 'a> {
    model: &'m PriceProbabilityModel<'a>,
}

impl<'m, 'a> FutureTransitionSampler<'m, 'a> {
    pub fn new(model: &'m PriceProbabilityModel<'a>) -> Self {
        FutureTransitionSampler { model }
    }

    /// Simulate `days` prices starting from `initial_price`.
    ///
    /// Each later day weights the intervals by the model probability of
    /// their midpoints, picks one, and draws a price uniformly inside it.
    /// Intervals that all score 0 are picked uniformly.
    pub fn simulate(
        &self,
        sku: &SkuData,
        days: usize,
        initial_price: f64,
        rng: &mut dyn RandomSource,
    ) -> Vec<f64> {
        if days == 0 {
            return Vec::new();
        }
        let mut trajectory = Vec::with_capacity(days);
        trajectory.push(initial_price);
        if sku.intervals.is_empty() {
            // Nothing to draw from; hold the opening price.
            trajectory.resize(days, initial_price);
            return trajectory;
        }

        let mut window = PriceWindow::starting_at(initial_price);
        let mut weights = vec![0.0; sku.intervals.len()];

        for day in 1..days {
            for (w, interval) in weights.iter_mut().zip(&sku.intervals) {
                *w = self.model.probability_quiet(
                    interval.midpoint(),
                    sku,
                    day,
                    window.as_slice(),
                    rng,
                );
            }

            let chosen = &sku.intervals[rng.categorical(&weights)];
            let price = rng.uniform(chosen.min_price, chosen.max_price);

            trajectory.push(price);
            window.push(price);
        }

        debug!(sku = %sku.sku, days, initial_price, "trajectory simulated");
        trajectory
    }
}
