use approx::assert_relative_eq;
use sku_forecast::history::{verify_input_data, HistoricalData, HistoricalRecord};
use sku_forecast::rng::{RandomSource, StdRandom};
use sku_forecast::sku::{PriceInterval, SkuData};
use sku_forecast::zscore::FeatureStats;
use sku_forecast::ForecastError;
use std::collections::BTreeMap;

fn map(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

// ═══════════════════════════════════════════════════════════════════════
// SKU intervals
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_interval_geometry() {
    let interval = PriceInterval::new(10.0, 20.0);
    assert!(interval.contains(10.0) && interval.contains(20.0));
    assert!(!interval.contains(20.01));
    assert_relative_eq!(interval.midpoint(), 15.0);
    assert_relative_eq!(interval.position_of(12.5), 0.25);

    let point = PriceInterval::new(5.0, 5.0);
    assert_eq!(point.position_of(5.0), 0.0);
}

#[test]
fn test_sku_from_intervals_derives_bounds() {
    let sku = SkuData::from_intervals(
        "9",
        vec![PriceInterval::new(20.0, 30.0), PriceInterval::new(5.0, 12.0)],
    );
    assert_relative_eq!(sku.global_min_price, 5.0);
    assert_relative_eq!(sku.global_max_price, 30.0);
    assert_relative_eq!(sku.uniform_probability(), 0.5);
    assert_eq!(sku.interval_for(25.0), Some(&sku.intervals[0]));
    assert!(sku.interval_for(15.0).is_none());
    sku.validate().unwrap();

    assert_eq!(SkuData::from_intervals("e", vec![]).uniform_probability(), 0.0);
}

#[test]
fn test_sku_validate() {
    let outside = SkuData::new("1", vec![PriceInterval::new(5.0, 40.0)], 10.0, 30.0);
    assert!(matches!(outside.validate(), Err(ForecastError::InvalidInput(_))));

    let inverted = SkuData::new("1", vec![PriceInterval::new(25.0, 15.0)], 10.0, 30.0);
    assert!(matches!(inverted.validate(), Err(ForecastError::InvalidInput(_))));
}

// ═══════════════════════════════════════════════════════════════════════
// Historical data checks
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_verify_input_data() {
    let sku = SkuData::from_intervals("1", vec![PriceInterval::new(10.0, 20.0)]);
    verify_input_data(&HistoricalData::from_prices(&[12.0, 13.0]), &sku).unwrap();

    // Suspicious but accepted
    verify_input_data(&HistoricalData::from_prices(&[0.0, 2e6]), &sku).unwrap();

    // Interval reaching past the global range
    let loose = SkuData::new("1", vec![PriceInterval::new(8.0, 20.0)], 10.0, 30.0);
    assert!(matches!(
        verify_input_data(&HistoricalData::from_prices(&[12.0, 13.0]), &loose),
        Err(ForecastError::InvalidInput(_))
    ));

    let mut record = HistoricalRecord::new();
    record.insert("units".to_string(), 3.0);
    let no_price = HistoricalData::new(vec!["units".to_string()], vec![record]);
    assert!(matches!(
        verify_input_data(&no_price, &sku),
        Err(ForecastError::InvalidInput(_))
    ));
}

// ═══════════════════════════════════════════════════════════════════════
// z-scores
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_zscore_and_inverse() {
    let stats = FeatureStats::new(map(&[("p", 10.0), ("q", 4.0)]), map(&[("p", 2.0), ("q", 0.0)]));

    assert_relative_eq!(stats.normalize(14.0, "p"), 2.0);
    // Zero std and unknown features score 0
    assert_eq!(stats.normalize(9.0, "q"), 0.0);
    assert_eq!(stats.normalize(9.0, "r"), 0.0);

    let z = stats.z_score(&map(&[("p", 6.0), ("r", 1.0)]));
    assert_eq!(z.len(), 1);
    assert_relative_eq!(z["p"], -2.0);

    let raw = stats.inverse_z_score(&map(&[("p", 1.5), ("r", 1.0)]));
    assert_eq!(raw.len(), 1);
    assert_relative_eq!(raw["p"], 13.0);
    assert!(FeatureStats::default().is_empty());
}

// ═══════════════════════════════════════════════════════════════════════
// Random source
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_std_random_edge_cases() {
    let mut rng = StdRandom::seeded(1);

    assert_eq!(rng.uniform(4.0, 4.0), 4.0);
    let swapped = rng.uniform(9.0, 3.0);
    assert!((3.0..9.0).contains(&swapped));

    assert_eq!(rng.normal(0.7, 0.0), 0.7);
    assert_eq!(rng.normal(0.7, f64::NAN), 0.7);

    assert_eq!(rng.categorical(&[]), 0);
    assert_eq!(rng.categorical(&[0.0, 3.0, 0.0]), 1);
    for _ in 0..50 {
        assert!(rng.categorical(&[0.0, 0.0, 0.0]) < 3);
    }
}

#[test]
fn test_std_random_seeded_sequences_repeat() {
    let mut a = StdRandom::new(Some(99));
    let mut b = StdRandom::seeded(99);
    for _ in 0..10 {
        assert_eq!(a.uniform(0.0, 1.0), b.uniform(0.0, 1.0));
        assert_eq!(a.normal(0.0, 1.0), b.normal(0.0, 1.0));
    }
}
