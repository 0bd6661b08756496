use std::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveDate};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::market::structs::Candle;

use super::errors::SeasonalityError;

/// Bucketing mode for one calendar view.
///
/// Day is input-driven (one bucket per day present in the candle set); the
/// year-scoped modes scan a fixed grid of calendar buckets and omit the
/// empty ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BucketMode {
    Day,
    Week { year: i32 },
    Month { year: i32 },
    Range { start: NaiveDate, end: NaiveDate },
}

/// Discrete calendar identifier of one bucket, derived deterministically
/// from candle timestamps and the bucketing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BucketKey {
    Day(NaiveDate),
    Week { start: NaiveDate, end: NaiveDate },
    Month { year: i32, month: u32 },
    Range { start: NaiveDate, end: NaiveDate },
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketKey::Day(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            BucketKey::Week { start, end } => {
                write!(f, "{}_{}", start.format("%Y-%m-%d"), end.format("%Y-%m-%d"))
            }
            BucketKey::Month { year, month } => write!(f, "{}-{:02}", year, month),
            BucketKey::Range { start, end } => {
                write!(f, "{}_{}", start.format("%Y-%m-%d"), end.format("%Y-%m-%d"))
            }
        }
    }
}

/// Close-vs-open direction of a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Neutral,
}

/// Per-bucket reduction of the candles that fell into it. Immutable once
/// computed; a re-fetch produces a fresh mapping rather than updating one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BucketMetrics {
    /// First candle's open, in ascending-time order.
    pub open: f64,
    /// Last candle's close.
    pub close: f64,
    pub volume_sum: f64,
    /// Mean of (high - low) across the bucket's candles.
    pub mean_range: f64,
    /// (close - open) / open * 100; NaN when open == 0.
    pub percent_change: f64,
    pub direction: Direction,
}

/// Reduce one bucket's candles into metrics. Fails with `DataGap` on an
/// empty bucket; callers recover by omitting the bucket from the mapping.
fn reduce_bucket(key: &BucketKey, candles: &[&Candle]) -> Result<BucketMetrics, SeasonalityError> {
    let (first, last) = match (candles.first(), candles.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(SeasonalityError::DataGap(key.to_string())),
    };

    let open = first.open;
    let close = last.close;
    let volume_sum: f64 = candles.iter().map(|c| c.volume).sum();
    let mean_range = candles.iter().map(|c| c.range()).sum::<f64>() / candles.len() as f64;
    let percent_change = if open == 0.0 {
        // Degenerate series: signal "no data" downstream instead of +/-inf.
        f64::NAN
    } else {
        (close - open) / open * 100.0
    };
    let direction = if close > open {
        Direction::Up
    } else if close < open {
        Direction::Down
    } else {
        Direction::Neutral
    };

    Ok(BucketMetrics { open, close, volume_sum, mean_range, percent_change, direction })
}

/// UTC calendar date a candle belongs to, keyed by its open time.
fn candle_date(candle: &Candle) -> Option<NaiveDate> {
    DateTime::from_timestamp_millis(candle.open_time).map(|dt| dt.date_naive())
}

/// Sunday-aligned start of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_sunday() as i64)
}

/// Group time-ordered candles into calendar buckets and reduce each bucket
/// to its metrics. Buckets with no candles are absent from the mapping
/// ("no data"), never present with zero metrics.
pub fn aggregate(
    candles: &[Candle],
    mode: &BucketMode,
) -> Result<FxHashMap<BucketKey, BucketMetrics>, SeasonalityError> {
    // Input arrives ascending from the API; sort defensively so first/last
    // reductions stay correct for merged multi-window fetches.
    let mut ordered: Vec<&Candle> = candles.iter().collect();
    ordered.sort_by_key(|c| c.open_time);

    let mut buckets: FxHashMap<BucketKey, BucketMetrics> = FxHashMap::default();

    match mode {
        BucketMode::Day => {
            let mut per_day: FxHashMap<NaiveDate, Vec<&Candle>> = FxHashMap::default();
            for &candle in &ordered {
                match candle_date(candle) {
                    Some(date) => per_day.entry(date).or_default().push(candle),
                    None => warn!("Skipping candle with invalid open_time: {}", candle.open_time),
                }
            }
            for (date, day_candles) in per_day {
                let key = BucketKey::Day(date);
                let metrics = reduce_bucket(&key, &day_candles)?;
                buckets.insert(key, metrics);
            }
        }
        BucketMode::Month { year } => {
            for month in 1..=12u32 {
                let key = BucketKey::Month { year: *year, month };
                let month_candles: Vec<&Candle> = ordered
                    .iter()
                    .filter(|c| {
                        candle_date(c)
                            .map(|d| d.year() == *year && d.month() == month)
                            .unwrap_or(false)
                    })
                    .copied()
                    .collect();
                match reduce_bucket(&key, &month_candles) {
                    Ok(metrics) => {
                        buckets.insert(key, metrics);
                    }
                    Err(SeasonalityError::DataGap(gap)) => {
                        debug!("Omitting empty month bucket {}", gap);
                    }
                    Err(e) => return Err(e),
                }
            }
        }
        BucketMode::Week { year } => {
            let first = week_start(
                NaiveDate::from_ymd_opt(*year, 1, 1).ok_or_else(|| {
                    SeasonalityError::InvalidArgument(format!("Invalid year: {}", year))
                })?,
            );
            let last = week_start(
                NaiveDate::from_ymd_opt(*year, 12, 31).ok_or_else(|| {
                    SeasonalityError::InvalidArgument(format!("Invalid year: {}", year))
                })?,
            );

            let mut start = first;
            while start <= last {
                let end = start + Duration::days(6);
                let key = BucketKey::Week { start, end };
                let week_candles: Vec<&Candle> = ordered
                    .iter()
                    .filter(|c| {
                        candle_date(c).map(|d| d >= start && d <= end).unwrap_or(false)
                    })
                    .copied()
                    .collect();
                match reduce_bucket(&key, &week_candles) {
                    Ok(metrics) => {
                        buckets.insert(key, metrics);
                    }
                    Err(SeasonalityError::DataGap(gap)) => {
                        debug!("Omitting empty week bucket {}", gap);
                    }
                    Err(e) => return Err(e),
                }
                start += Duration::days(7);
            }
        }
        BucketMode::Range { start, end } => {
            if start > end {
                return Err(SeasonalityError::InvalidArgument(format!(
                    "Range start {} is after end {}",
                    start, end
                )));
            }
            let key = BucketKey::Range { start: *start, end: *end };
            let in_range: Vec<&Candle> = ordered
                .iter()
                .filter(|c| {
                    candle_date(c).map(|d| d >= *start && d <= *end).unwrap_or(false)
                })
                .copied()
                .collect();
            match reduce_bucket(&key, &in_range) {
                Ok(metrics) => {
                    buckets.insert(key, metrics);
                }
                Err(SeasonalityError::DataGap(gap)) => {
                    debug!("Omitting empty range bucket {}", gap);
                }
                Err(e) => return Err(e),
            }
        }
    }

    debug!("Aggregated {} candles into {} buckets ({:?})", candles.len(), buckets.len(), mode);
    Ok(buckets)
}
