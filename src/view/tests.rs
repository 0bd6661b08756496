use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, TimeZone, Utc};
use kameo::request::MessageSend;
use tokio::time::sleep;
use tokio_test::assert_ok;

use crate::api::types::ApiError;
use crate::market::provider::{MockSeriesProvider, SeriesProvider};
use crate::market::structs::{Candle, Interval, TimestampMS};
use crate::seasonality::bucket::BucketKey;
use crate::seasonality::errors::SeasonalityError;

use super::actor::{CalendarViewActor, ViewAsk, ViewReply, ViewState, ViewTell};
use super::{build_view, ViewRequest};

fn day_candle(year: i32, month: u32, day: u32, volume: f64) -> Candle {
    let open_time = Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap().timestamp_millis();
    Candle::new_from_values(open_time, open_time + 86_400_000 - 1, 100.0, 110.0, 95.0, 105.0, volume)
}

fn month_of(start_ms: TimestampMS) -> u32 {
    chrono::DateTime::from_timestamp_millis(start_ms).unwrap().month()
}

#[tokio::test]
async fn test_build_day_view_classifies_fetched_candles() {
    let mut provider = MockSeriesProvider::new();
    provider
        .expect_fetch_series()
        .times(1)
        .returning(|_, interval, _, _, limit| {
            assert_eq!(interval, Interval::OneDay);
            assert_eq!(limit, 1000);
            Ok(vec![
                day_candle(2024, 3, 1, 10.0),
                day_candle(2024, 3, 2, 30.0),
                day_candle(2024, 3, 3, 50.0),
            ])
        });

    let request = ViewRequest::Day { symbol: "BTCUSDT".to_string(), year: 2024, month: 3 };
    let view = build_view(&provider, &request).await.unwrap();

    assert_eq!(view.buckets.len(), 3);
    assert!(view.volume_thresholds.low <= view.volume_thresholds.high);
    let key = BucketKey::Day(NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
    assert!(view.buckets.contains_key(&key));
}

#[tokio::test]
async fn test_build_month_view_issues_twelve_fetches_and_omits_empty_months() {
    let mut provider = MockSeriesProvider::new();
    provider.expect_fetch_series().times(12).returning(|_, _, start, _, _| {
        match month_of(start) {
            3 => Ok(vec![day_candle(2024, 3, 5, 20.0), day_candle(2024, 3, 6, 25.0)]),
            7 => Ok(vec![day_candle(2024, 7, 10, 40.0)]),
            _ => Ok(Vec::new()),
        }
    });

    let request = ViewRequest::Month { symbol: "BTCUSDT".to_string(), year: 2024 };
    let view = build_view(&provider, &request).await.unwrap();

    assert_eq!(view.buckets.len(), 2);
    assert!(view.buckets.contains_key(&BucketKey::Month { year: 2024, month: 3 }));
    assert!(view.buckets.contains_key(&BucketKey::Month { year: 2024, month: 7 }));
}

#[tokio::test]
async fn test_build_view_rejects_out_of_guard_anchor_before_fetching() {
    // No expectations set: any fetch would panic the mock.
    let provider = MockSeriesProvider::new();

    let request = ViewRequest::Month { symbol: "BTCUSDT".to_string(), year: 2019 };
    let result = build_view(&provider, &request).await;
    assert!(matches!(result, Err(SeasonalityError::InvalidArgument(_))));

    let inverted = ViewRequest::Period {
        symbol: "BTCUSDT".to_string(),
        start: NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
        end: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
    };
    assert!(matches!(
        build_view(&provider, &inverted).await,
        Err(SeasonalityError::InvalidArgument(_))
    ));
}

#[tokio::test]
async fn test_network_failure_surfaces_without_retry() {
    let mut provider = MockSeriesProvider::new();
    provider
        .expect_fetch_series()
        .times(1)
        .returning(|_, _, _, _, _| Err(ApiError::Network("connection reset".to_string())));

    let request = ViewRequest::Day { symbol: "BTCUSDT".to_string(), year: 2024, month: 3 };
    let result = build_view(&provider, &request).await;
    assert!(matches!(result, Err(SeasonalityError::Network(_))));
}

#[tokio::test]
async fn test_period_view_produces_single_range_bucket() {
    let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2024, 2, 10).unwrap();

    let mut provider = MockSeriesProvider::new();
    provider.expect_fetch_series().times(1).returning(|_, _, _, _, _| {
        Ok(vec![day_candle(2024, 2, 1, 5.0), day_candle(2024, 2, 10, 7.0)])
    });

    let request = ViewRequest::Period { symbol: "BTCUSDT".to_string(), start, end };
    let view = build_view(&provider, &request).await.unwrap();

    assert_eq!(view.buckets.len(), 1);
    let bucket = &view.buckets[&BucketKey::Range { start, end }];
    assert_eq!(bucket.metrics.volume_sum, 12.0);
}

/// Provider whose latency depends on the symbol, for exercising the
/// generation-token discipline: the first symbol answers slowly, the
/// second almost immediately.
struct ScriptedProvider;

#[async_trait]
impl SeriesProvider for ScriptedProvider {
    async fn fetch_series(
        &self,
        symbol: &str,
        _interval: Interval,
        _start: TimestampMS,
        _end: TimestampMS,
        _limit: u32,
    ) -> Result<Vec<Candle>, ApiError> {
        let delay_ms = if symbol == "SLOWUSDT" { 300 } else { 10 };
        sleep(Duration::from_millis(delay_ms)).await;
        Ok(vec![day_candle(2024, 3, 1, 42.0)])
    }

    async fn list_tradable_symbols(&self) -> Result<Vec<String>, ApiError> {
        Ok(vec!["SLOWUSDT".to_string(), "FASTUSDT".to_string()])
    }
}

#[tokio::test]
async fn test_stale_refresh_is_discarded_on_symbol_switch() {
    let actor = CalendarViewActor::new(Arc::new(ScriptedProvider));
    let actor_ref = kameo::spawn(actor);

    let slow = ViewRequest::Day { symbol: "SLOWUSDT".to_string(), year: 2024, month: 3 };
    let fast = ViewRequest::Day { symbol: "FASTUSDT".to_string(), year: 2024, month: 3 };

    assert_ok!(actor_ref.tell(ViewTell::Refresh(slow)).send().await);
    assert_ok!(actor_ref.tell(ViewTell::Refresh(fast)).send().await);

    // Long enough for the superseded slow fetch to resolve and be dropped.
    sleep(Duration::from_millis(600)).await;

    let ViewReply::State(state) = actor_ref.ask(ViewAsk::GetState).send().await.unwrap();
    match state {
        ViewState::Ready(snapshot) => {
            assert_eq!(snapshot.request.symbol(), "FASTUSDT");
            assert_eq!(snapshot.view.buckets.len(), 1);
        }
        other => panic!("Expected ready state, got {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_refresh_marks_view_failed() {
    let actor = CalendarViewActor::new(Arc::new(ScriptedProvider));
    let actor_ref = kameo::spawn(actor);

    let request = ViewRequest::Day { symbol: "FASTUSDT".to_string(), year: 2026, month: 1 };
    actor_ref.tell(ViewTell::Refresh(request)).send().await.unwrap();
    sleep(Duration::from_millis(50)).await;

    let ViewReply::State(state) = actor_ref.ask(ViewAsk::GetState).send().await.unwrap();
    assert!(matches!(state, ViewState::Failed(_)));
}
