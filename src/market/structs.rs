use serde::{Deserialize, Serialize};

use crate::seasonality::errors::SeasonalityError;

pub type TimestampMS = i64;

/// One spot OHLCV observation for a fixed interval.
///
/// Invariant `low <= open, close <= high` is upstream-provided by the
/// exchange and not re-validated here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: TimestampMS,
    pub close_time: TimestampMS,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new_from_values(
        open_time: TimestampMS,
        close_time: TimestampMS,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self { open_time, close_time, open, high, low, close, volume }
    }

    /// Intraday range, the volatility primitive of the calendar views.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: TimestampMS,
    pub end: TimestampMS,
}

/// Candle intervals the calendar and drill-down chart consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    OneHour,
    OneDay,
}

impl Interval {
    /// Binance wire string for this interval.
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneHour => "1h",
            Interval::OneDay => "1d",
        }
    }

    pub fn seconds(&self) -> u64 {
        match self {
            Interval::OneHour => 3600,
            Interval::OneDay => 86400,
        }
    }
}

impl std::str::FromStr for Interval {
    type Err = SeasonalityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1h" => Ok(Interval::OneHour),
            "1d" => Ok(Interval::OneDay),
            other => Err(SeasonalityError::InvalidArgument(format!(
                "Unsupported interval: {}",
                other
            ))),
        }
    }
}
