pub mod actor;

#[cfg(test)]
mod tests;

use chrono::{Datelike, Duration, NaiveDate};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::market::provider::SeriesProvider;
use crate::market::structs::{Candle, Interval, TimeRange, TimestampMS};
use crate::seasonality::bucket::{aggregate, week_start, BucketMode};
use crate::seasonality::classify::{classify, ClassifiedView};
use crate::seasonality::errors::SeasonalityError;

pub use actor::{CalendarViewActor, ViewAsk, ViewReply, ViewSnapshot, ViewState, ViewTell};

/// Wire cap on klines per request.
pub const MAX_KLINE_LIMIT: u32 = 1000;

/// Static guard on all view anchors; not derived from the data source.
pub fn min_view_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).expect("valid guard date")
}

pub fn max_view_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 12, 31).expect("valid guard date")
}

/// One view-render request: symbol plus calendar anchor. Day renders the
/// daily cells of one month; Week and Month render a whole year; Period
/// renders an arbitrary date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewRequest {
    Day { symbol: String, year: i32, month: u32 },
    Week { symbol: String, year: i32 },
    Month { symbol: String, year: i32 },
    Period { symbol: String, start: NaiveDate, end: NaiveDate },
}

impl ViewRequest {
    pub fn symbol(&self) -> &str {
        match self {
            ViewRequest::Day { symbol, .. }
            | ViewRequest::Week { symbol, .. }
            | ViewRequest::Month { symbol, .. }
            | ViewRequest::Period { symbol, .. } => symbol,
        }
    }

    /// Bucketing mode the aggregator runs under for this request.
    pub fn bucket_mode(&self) -> BucketMode {
        match self {
            ViewRequest::Day { .. } => BucketMode::Day,
            ViewRequest::Week { year, .. } => BucketMode::Week { year: *year },
            ViewRequest::Month { year, .. } => BucketMode::Month { year: *year },
            ViewRequest::Period { start, end, .. } => {
                BucketMode::Range { start: *start, end: *end }
            }
        }
    }

    /// Enforce the static 2020-2025 date guard and well-formed bounds.
    pub fn validate(&self) -> Result<(), SeasonalityError> {
        let (min, max) = (min_view_date(), max_view_date());
        match self {
            ViewRequest::Day { year, month, .. } => {
                let anchor = NaiveDate::from_ymd_opt(*year, *month, 1).ok_or_else(|| {
                    SeasonalityError::InvalidArgument(format!("Invalid month: {}-{}", year, month))
                })?;
                if anchor < min || anchor > max {
                    return Err(SeasonalityError::InvalidArgument(format!(
                        "Anchor {} outside supported range {}..={}",
                        anchor, min, max
                    )));
                }
            }
            ViewRequest::Week { year, .. } | ViewRequest::Month { year, .. } => {
                if *year < min.year() || *year > max.year() {
                    return Err(SeasonalityError::InvalidArgument(format!(
                        "Year {} outside supported range {}..={}",
                        year,
                        min.year(),
                        max.year()
                    )));
                }
            }
            ViewRequest::Period { start, end, .. } => {
                if start > end {
                    return Err(SeasonalityError::InvalidArgument(format!(
                        "Period start {} is after end {}",
                        start, end
                    )));
                }
                if *start < min || *end > max {
                    return Err(SeasonalityError::InvalidArgument(format!(
                        "Period {}..{} outside supported range {}..={}",
                        start, end, min, max
                    )));
                }
            }
        }
        Ok(())
    }

    /// Millisecond fetch windows this request needs, one per remote call.
    pub fn fetch_windows(&self) -> Vec<TimeRange> {
        match self {
            ViewRequest::Day { year, month, .. } => vec![month_window(*year, *month)],
            ViewRequest::Month { year, .. } => {
                (1..=12).map(|month| month_window(*year, month)).collect()
            }
            ViewRequest::Week { year, .. } => {
                let first = week_start(
                    NaiveDate::from_ymd_opt(*year, 1, 1).expect("valid year start"),
                );
                let last = week_start(
                    NaiveDate::from_ymd_opt(*year, 12, 31).expect("valid year end"),
                );
                let mut windows = Vec::new();
                let mut start = first;
                while start <= last {
                    windows.push(TimeRange {
                        start: date_start_ms(start),
                        end: date_start_ms(start + Duration::days(7)) - 1,
                    });
                    start += Duration::days(7);
                }
                windows
            }
            ViewRequest::Period { start, end, .. } => vec![TimeRange {
                start: date_start_ms(*start),
                end: date_start_ms(*end + Duration::days(1)) - 1,
            }],
        }
    }
}

/// Midnight UTC of `date`, in epoch milliseconds.
fn date_start_ms(date: NaiveDate) -> TimestampMS {
    date.and_hms_opt(0, 0, 0).expect("midnight exists").and_utc().timestamp_millis()
}

/// Inclusive millisecond window covering one calendar month.
fn month_window(year: i32, month: u32) -> TimeRange {
    let start = NaiveDate::from_ymd_opt(year, month, 1).expect("valid month start");
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1).expect("valid year rollover")
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1).expect("valid next month")
    };
    TimeRange { start: date_start_ms(start), end: date_start_ms(next) - 1 }
}

/// Run one full view-render cycle: fetch every window, then aggregate and
/// classify over the complete candle set.
///
/// Windows are independent, so they are fetched concurrently; nothing is
/// aggregated until every fetch has resolved, which keeps classification
/// running over the complete bucket set.
pub async fn build_view(
    provider: &dyn SeriesProvider,
    request: &ViewRequest,
) -> Result<ClassifiedView, SeasonalityError> {
    request.validate()?;

    let windows = request.fetch_windows();
    debug!("Building {:?} view from {} fetch window(s)", request.bucket_mode(), windows.len());

    let fetches = windows.iter().map(|window| {
        provider.fetch_series(
            request.symbol(),
            Interval::OneDay,
            window.start,
            window.end,
            MAX_KLINE_LIMIT,
        )
    });
    let per_window = try_join_all(fetches).await?;

    let candles: Vec<Candle> = per_window.into_iter().flatten().collect();
    let buckets = aggregate(&candles, &request.bucket_mode())?;
    classify(&buckets)
}
