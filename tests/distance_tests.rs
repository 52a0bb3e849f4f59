use approx::assert_relative_eq;
use sku_forecast::analytics;
use sku_forecast::distance::TrajectoryDistance;
use sku_forecast::history::HistoricalData;
use sku_forecast::probability::{PriceProbabilityModel, CENTER_SPREAD, DAY_DECAY};
use sku_forecast::rng::{RandomSource, StdRandom};
use sku_forecast::sku::{PriceInterval, SkuData};

/// Uniform draws return the lower bound, so the external jitter is
/// always exactly -1%.
struct LowRandom;

impl RandomSource for LowRandom {
    fn uniform(&mut self, lo: f64, _hi: f64) -> f64 {
        lo
    }

    fn normal(&mut self, mean: f64, _sd: f64) -> f64 {
        mean
    }

    fn categorical(&mut self, _weights: &[f64]) -> usize {
        0
    }
}

fn sku(n: usize) -> SkuData {
    let intervals = (0..n)
        .map(|i| PriceInterval::new(10.0 * (i + 1) as f64, 10.0 * (i + 2) as f64))
        .collect();
    SkuData::from_intervals("3003", intervals)
}

#[test]
fn test_prices_outside_intervals_score_uniform_share() {
    let history = HistoricalData::from_prices(&[15.0, 15.0, 15.0]);
    let model = PriceProbabilityModel::new(&history);
    let scorer = TrajectoryDistance::new(&model);
    let mut rng = StdRandom::seeded(1);

    for n in [1, 2, 4] {
        let trajectory = vec![1000.0; 6];
        let d = scorer.distance(&trajectory, &sku(n), 6, &mut rng);
        assert_relative_eq!(d, 1.0 / n as f64, epsilon = 1e-12);
    }
}

#[test]
fn test_zero_days_is_zero() {
    let history = HistoricalData::from_prices(&[15.0, 15.0]);
    let model = PriceProbabilityModel::new(&history);
    let scorer = TrajectoryDistance::new(&model);
    let mut rng = StdRandom::seeded(1);

    assert_eq!(scorer.distance(&[], &sku(2), 0, &mut rng), 0.0);
}

#[test]
fn test_distance_bounded_and_finite() {
    let history = HistoricalData::from_prices(&[15.0, 14.0, 16.0, 15.0]);
    let model = PriceProbabilityModel::new(&history);
    let scorer = TrajectoryDistance::new(&model);
    let mut rng = StdRandom::seeded(9);

    let trajectory = [12.0, 18.0, 25.0, 11.0, 29.0];
    let d = scorer.distance(&trajectory, &sku(2), trajectory.len(), &mut rng);
    assert!(d.is_finite());
    assert!(d >= 0.0 && d <= 1.0, "distance {}", d);
}

#[test]
fn test_only_first_days_are_scored() {
    let history = HistoricalData::from_prices(&[15.0, 15.0, 15.0]);
    let model = PriceProbabilityModel::new(&history);
    let scorer = TrajectoryDistance::new(&model);
    let mut rng = StdRandom::seeded(4);

    // Two out-of-range days averaged over days = 2
    let d = scorer.distance(&[500.0, 500.0, 15.0, 15.0], &sku(2), 2, &mut rng);
    assert_relative_eq!(d, 0.5, epsilon = 1e-12);
}

#[test]
fn test_short_trajectory_averages_scored_days() {
    let history = HistoricalData::from_prices(&[15.0, 15.0, 15.0]);
    let model = PriceProbabilityModel::new(&history);
    let scorer = TrajectoryDistance::new(&model);
    let mut rng = StdRandom::seeded(2);

    // One out-of-range price asked for four days still scores 1/2
    let d = scorer.distance(&[1000.0], &sku(2), 4, &mut rng);
    assert_relative_eq!(d, 0.5, epsilon = 1e-12);
}

#[test]
fn test_days_scored_against_full_trajectory() {
    // Newest first [4, 2, 3, 1]: slope -0.8, min 1, range 3
    let history = HistoricalData::from_prices(&[1.0, 3.0, 2.0, 4.0]);
    let model = PriceProbabilityModel::new(&history);
    assert_relative_eq!(model.trend(), -0.6, epsilon = 1e-12);
    let trend = model.trend();
    let volatility = model.volatility();
    assert!(volatility > 0.0);

    let sku = sku(2);
    let trajectory = [15.0, 15.1, 14.9, 15.05];
    let autocorrelation = analytics::autocorrelation(&trajectory);
    let last = trajectory[trajectory.len() - 1];

    let expected: Vec<f64> = trajectory
        .iter()
        .enumerate()
        .map(|(day, &price)| {
            let position = (price - 10.0) / 10.0;
            0.5 * (-(position - 0.5_f64).powi(2) / CENTER_SPREAD).exp()
                * (-DAY_DECAY * day as f64).exp()
                * (1.0 + trend)
                * (1.0 + analytics::seasonality(day))
                * (1.0 - 0.01)
                * (1.0 + autocorrelation)
                * (-volatility * (price - last).abs()).exp()
        })
        .collect();
    assert!(expected.iter().all(|p| *p > 0.0 && *p < 0.5));
    let expected_distance =
        expected.iter().map(|p| (p - 0.5).abs()).sum::<f64>() / trajectory.len() as f64;

    let scorer = TrajectoryDistance::new(&model);
    let d = scorer.distance(&trajectory, &sku, trajectory.len(), &mut LowRandom);
    assert_relative_eq!(d, expected_distance, epsilon = 1e-12);

    // Scoring without the trajectory as context gives a different answer
    let mut rng = LowRandom;
    let detached = trajectory
        .iter()
        .enumerate()
        .map(|(day, &price)| (model.probability(price, &sku, day, &[], &mut rng) - 0.5).abs())
        .sum::<f64>()
        / trajectory.len() as f64;
    assert!((detached - d).abs() > 1e-6);
}
