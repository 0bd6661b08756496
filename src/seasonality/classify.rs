use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::bucket::{BucketKey, BucketMetrics};
use super::errors::SeasonalityError;
use super::quantile::quantile;

/// Tertile classification band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    Low,
    Mid,
    High,
}

/// The 33rd/66th percentile cut points for one metric dimension, computed
/// once per view over the complete bucket set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ThresholdPair {
    pub low: f64,
    pub high: f64,
}

impl ThresholdPair {
    /// Sentinel for a view with no buckets to classify.
    pub fn no_data() -> Self {
        Self { low: f64::NAN, high: f64::NAN }
    }

    pub fn is_no_data(&self) -> bool {
        self.low.is_nan() && self.high.is_nan()
    }

    /// Strict-`<` tier assignment: a value equal to a cut point falls into
    /// the tier below it. NaN carries no classification.
    pub fn tier_for(&self, value: f64) -> Option<Tier> {
        if value.is_nan() || self.is_no_data() {
            return None;
        }
        if value < self.low {
            Some(Tier::Low)
        } else if value < self.high {
            Some(Tier::Mid)
        } else {
            Some(Tier::High)
        }
    }
}

/// A bucket with its tertile classes attached; the final output consumed by
/// the presentation layer. A `None` tier means "no classification" (NaN
/// metric) and renders as the theme default.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClassifiedBucket {
    pub metrics: BucketMetrics,
    pub volatility_tier: Option<Tier>,
    pub volume_tier: Option<Tier>,
}

/// Complete classification result for one view-render cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedView {
    pub volatility_thresholds: ThresholdPair,
    pub volume_thresholds: ThresholdPair,
    pub buckets: FxHashMap<BucketKey, ClassifiedBucket>,
}

/// Classify every bucket into volatility and volume tertiles against cut
/// points computed from the full metric set.
///
/// An empty metric set yields the `no_data` threshold sentinel with an empty
/// bucket map rather than an error. A single-bucket set classifies as High
/// on both dimensions: both cut points equal the bucket's own value and the
/// strict comparisons fail. That edge falls out of the `<` semantics rather
/// than a deliberate ranking, and is kept for compatibility.
pub fn classify(
    metrics: &FxHashMap<BucketKey, BucketMetrics>,
) -> Result<ClassifiedView, SeasonalityError> {
    if metrics.is_empty() {
        debug!("Classifying empty bucket set; returning no-data thresholds");
        return Ok(ClassifiedView {
            volatility_thresholds: ThresholdPair::no_data(),
            volume_thresholds: ThresholdPair::no_data(),
            buckets: FxHashMap::default(),
        });
    }

    let ranges: Vec<f64> = metrics.values().map(|m| m.mean_range).collect();
    let volumes: Vec<f64> = metrics.values().map(|m| m.volume_sum).collect();

    let volatility_thresholds = ThresholdPair {
        low: quantile(&ranges, 0.33)?,
        high: quantile(&ranges, 0.66)?,
    };
    let volume_thresholds = ThresholdPair {
        low: quantile(&volumes, 0.33)?,
        high: quantile(&volumes, 0.66)?,
    };

    let buckets = metrics
        .iter()
        .map(|(key, m)| {
            let classified = ClassifiedBucket {
                metrics: *m,
                volatility_tier: volatility_thresholds.tier_for(m.mean_range),
                volume_tier: volume_thresholds.tier_for(m.volume_sum),
            };
            (*key, classified)
        })
        .collect();

    debug!(
        "Classified {} buckets (volatility cuts {:.4}/{:.4}, volume cuts {:.4}/{:.4})",
        metrics.len(),
        volatility_thresholds.low,
        volatility_thresholds.high,
        volume_thresholds.low,
        volume_thresholds.high
    );

    Ok(ClassifiedView { volatility_thresholds, volume_thresholds, buckets })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seasonality::bucket::Direction;
    use chrono::NaiveDate;

    fn metrics(mean_range: f64, volume_sum: f64) -> BucketMetrics {
        BucketMetrics {
            open: 100.0,
            close: 101.0,
            volume_sum,
            mean_range,
            percent_change: 1.0,
            direction: Direction::Up,
        }
    }

    fn key(day: u32) -> BucketKey {
        BucketKey::Day(NaiveDate::from_ymd_opt(2024, 1, day).unwrap())
    }

    fn bucket_set(values: &[(f64, f64)]) -> FxHashMap<BucketKey, BucketMetrics> {
        values
            .iter()
            .enumerate()
            .map(|(i, (range, volume))| (key(i as u32 + 1), metrics(*range, *volume)))
            .collect()
    }

    #[test]
    fn test_thresholds_are_ordered() {
        let set = bucket_set(&[(5.0, 10.0), (1.0, 50.0), (3.0, 30.0), (9.0, 20.0)]);
        let view = classify(&set).unwrap();
        assert!(view.volatility_thresholds.low <= view.volatility_thresholds.high);
        assert!(view.volume_thresholds.low <= view.volume_thresholds.high);
    }

    #[test]
    fn test_value_at_cut_point_lands_in_upper_tier() {
        // Volumes 10..50: low cut = 23.2, high cut = 36.4. Strict `<` means a
        // value exactly equal to a cut point falls through to the next tier.
        let volumes = [10.0, 20.0, 30.0, 40.0, 50.0];
        let cuts = ThresholdPair {
            low: quantile(&volumes, 0.33).unwrap(),
            high: quantile(&volumes, 0.66).unwrap(),
        };

        assert_eq!(cuts.tier_for(cuts.low), Some(Tier::Mid));
        assert_eq!(cuts.tier_for(10.0), Some(Tier::Low));
        assert_eq!(cuts.tier_for(30.0), Some(Tier::Mid));
        assert_eq!(cuts.tier_for(cuts.high), Some(Tier::High));
        assert_eq!(cuts.tier_for(50.0), Some(Tier::High));
    }

    #[test]
    fn test_single_bucket_lands_in_high_tier() {
        let set = bucket_set(&[(4.2, 1000.0)]);
        let view = classify(&set).unwrap();
        let classified = view.buckets.values().next().unwrap();

        // Both cut points collapse onto the bucket's own values, so strict
        // `<` fails twice and the bucket classifies High on both axes.
        assert_eq!(view.volatility_thresholds.low, view.volatility_thresholds.high);
        assert_eq!(classified.volatility_tier, Some(Tier::High));
        assert_eq!(classified.volume_tier, Some(Tier::High));
    }

    #[test]
    fn test_classification_is_idempotent() {
        let set = bucket_set(&[(5.0, 10.0), (1.0, 50.0), (3.0, 30.0)]);
        let first = classify(&set).unwrap();
        let second = classify(&set).unwrap();
        for (key, bucket) in &first.buckets {
            let other = &second.buckets[key];
            assert_eq!(bucket.volatility_tier, other.volatility_tier);
            assert_eq!(bucket.volume_tier, other.volume_tier);
        }
    }

    #[test]
    fn test_empty_set_yields_no_data_sentinel() {
        let view = classify(&FxHashMap::default()).unwrap();
        assert!(view.volatility_thresholds.is_no_data());
        assert!(view.volume_thresholds.is_no_data());
        assert!(view.buckets.is_empty());
    }

    #[test]
    fn test_nan_metric_carries_no_classification() {
        let cuts = ThresholdPair { low: 1.0, high: 2.0 };
        assert_eq!(cuts.tier_for(f64::NAN), None);
        assert_eq!(ThresholdPair::no_data().tier_for(1.5), None);
    }
}
