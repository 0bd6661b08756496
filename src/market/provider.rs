use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::api::binance::BinanceSpotClient;
use crate::api::types::{ApiError, ApiRequest, ApiStats};

use super::structs::{Candle, Interval, TimestampMS};

/// Seam between the aggregation pipeline and the market-data source.
///
/// The pipeline only ever sees this trait; retry and pacing policy live
/// behind it, never in the aggregation logic.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SeriesProvider: Send + Sync {
    /// Fetch an ascending candle sequence for [start, end], at most `limit`
    /// (capped at 1000 by the wire contract).
    async fn fetch_series(
        &self,
        symbol: &str,
        interval: Interval,
        start: TimestampMS,
        end: TimestampMS,
        limit: u32,
    ) -> Result<Vec<Candle>, ApiError>;

    /// All symbols currently flagged tradable.
    async fn list_tradable_symbols(&self) -> Result<Vec<String>, ApiError>;

    /// Request counters for the underlying transport, when the source keeps
    /// any. In-memory sources report nothing.
    fn session_stats(&self) -> Option<ApiStats> {
        None
    }
}

#[async_trait]
impl SeriesProvider for BinanceSpotClient {
    async fn fetch_series(
        &self,
        symbol: &str,
        interval: Interval,
        start: TimestampMS,
        end: TimestampMS,
        limit: u32,
    ) -> Result<Vec<Candle>, ApiError> {
        let request = ApiRequest::new_klines(symbol.to_string(), interval.as_str().to_string())
            .with_time_range(start, end)
            .with_limit(limit);
        self.fetch_klines_with_retry(request).await
    }

    async fn list_tradable_symbols(&self) -> Result<Vec<String>, ApiError> {
        self.fetch_tradable_symbols().await
    }

    fn session_stats(&self) -> Option<ApiStats> {
        Some(self.stats())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::ApiConfig;

    #[test]
    fn test_spot_client_exposes_session_stats() {
        let client = BinanceSpotClient::new(ApiConfig::binance_spot()).unwrap();
        let stats = client.session_stats().unwrap();
        assert_eq!(stats.requests_made, 0);
        assert_eq!(stats.success_rate(), 0.0);
    }
}
