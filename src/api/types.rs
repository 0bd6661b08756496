use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::market::structs::TimestampMS;

/// Supported API endpoints and data types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApiEndpoint {
    /// Kline/Candlestick data
    Klines,
    /// Exchange info (symbol listing with trading status)
    ExchangeInfo,
    /// Latest price for a symbol
    TickerPrice,
    /// Order book depth
    Depth,
}

impl ApiEndpoint {
    /// Get the Binance Spot API path for this endpoint
    pub fn binance_path(&self) -> &'static str {
        match self {
            ApiEndpoint::Klines => "/api/v3/klines",
            ApiEndpoint::ExchangeInfo => "/api/v3/exchangeInfo",
            ApiEndpoint::TickerPrice => "/api/v3/ticker/price",
            ApiEndpoint::Depth => "/api/v3/depth",
        }
    }
}

/// API request configuration
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub endpoint: ApiEndpoint,
    pub symbol: String,
    pub interval: String,
    pub start_time: Option<TimestampMS>,
    pub end_time: Option<TimestampMS>,
    pub limit: Option<u32>,
}

impl ApiRequest {
    pub fn new_klines(symbol: String, interval: String) -> Self {
        Self {
            endpoint: ApiEndpoint::Klines,
            symbol,
            interval,
            start_time: None,
            end_time: None,
            limit: None,
        }
    }

    pub fn with_time_range(mut self, start_time: TimestampMS, end_time: TimestampMS) -> Self {
        self.start_time = Some(start_time);
        self.end_time = Some(end_time);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Rate limiting information from API headers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitInfo {
    pub requests_used: u32,
    pub requests_limit: u32,
    pub retry_after: Option<u32>,
}

/// Request counters, logged when the owning actor stops.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiStats {
    pub requests_made: u64,
    pub requests_successful: u64,
    pub requests_failed: u64,
    pub rate_limit_hits: u64,
    pub total_candles_fetched: u64,
}

impl ApiStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&mut self) {
        self.requests_made += 1;
    }

    pub fn record_success(&mut self, candles_count: u64) {
        self.requests_successful += 1;
        self.total_candles_fetched += candles_count;
    }

    pub fn record_failure(&mut self) {
        self.requests_failed += 1;
    }

    pub fn record_rate_limit(&mut self) {
        self.rate_limit_hits += 1;
        self.record_failure();
    }

    pub fn success_rate(&self) -> f64 {
        if self.requests_made == 0 {
            0.0
        } else {
            self.requests_successful as f64 / self.requests_made as f64
        }
    }
}

/// Configuration for the spot API client
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub rate_limit_delay_ms: u64,
}

impl ApiConfig {
    /// Create Binance Spot API configuration
    pub fn binance_spot() -> Self {
        Self {
            base_url: "https://api.binance.com".to_string(),
            timeout_seconds: 30,
            max_retries: 3,
            rate_limit_delay_ms: 50,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::binance_spot()
    }
}

/// API error types
#[derive(Error, Debug, Clone)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ApiError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::Http(_))
    }

    pub fn is_rate_limit(&self) -> bool {
        matches!(self, ApiError::RateLimit(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_rate_over_mixed_session() {
        let mut stats = ApiStats::new();
        assert_eq!(stats.success_rate(), 0.0);

        for _ in 0..4 {
            stats.record_request();
        }
        stats.record_success(500);
        stats.record_success(250);
        stats.record_failure();
        stats.record_rate_limit();

        assert_eq!(stats.requests_made, 4);
        assert_eq!(stats.requests_failed, 2);
        assert_eq!(stats.rate_limit_hits, 1);
        assert_eq!(stats.total_candles_fetched, 750);
        assert_eq!(stats.success_rate(), 0.5);
    }
}
