use std::time::Duration;

use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::api::types::{ApiConfig, ApiEndpoint, ApiError, ApiRequest, ApiStats, RateLimitInfo};
use crate::market::structs::{Candle, TimestampMS};

/// Aggregated order book depth used to approximate liquidity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderBookLiquidity {
    pub bid_liquidity: f64,
    pub ask_liquidity: f64,
    pub total_liquidity: f64,
}

#[derive(Debug, Deserialize)]
struct ExchangeInfoResponse {
    symbols: Vec<ExchangeSymbol>,
}

#[derive(Debug, Deserialize)]
struct ExchangeSymbol {
    symbol: String,
    status: String,
    #[serde(rename = "isSpotTradingAllowed")]
    is_spot_trading_allowed: bool,
}

#[derive(Debug, Deserialize)]
struct TickerPrice {
    price: String,
}

#[derive(Debug, Deserialize)]
struct DepthResponse {
    bids: Vec<[String; 2]>,
    asks: Vec<[String; 2]>,
}

/// Binance Spot API client for klines, symbol listing, price and depth data
pub struct BinanceSpotClient {
    client: reqwest::Client,
    config: ApiConfig,
    // Serializes request pacing so the client can be shared behind an Arc.
    last_request_time: Mutex<Option<Instant>>,
    stats: std::sync::Mutex<ApiStats>,
}

impl BinanceSpotClient {
    /// Create a new Binance spot client
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            last_request_time: Mutex::new(None),
            stats: std::sync::Mutex::new(ApiStats::new()),
        })
    }

    /// Snapshot of the request counters
    pub fn stats(&self) -> ApiStats {
        self.stats.lock().expect("stats lock poisoned").clone()
    }

    fn with_stats(&self, update: impl FnOnce(&mut ApiStats)) {
        if let Ok(mut stats) = self.stats.lock() {
            update(&mut stats);
        }
    }

    /// Fetch klines data from the spot API
    pub async fn fetch_klines(&self, request: ApiRequest) -> Result<Vec<Candle>, ApiError> {
        let url = self.build_klines_url(&request);
        debug!("Fetching klines from: {}", url);

        let response = self.get(&url).await?;
        let rate_limit_info = self.parse_rate_limit_headers(&response);
        if let Some(info) = &rate_limit_info {
            debug!("Rate limit usage: {}/{}", info.requests_used, info.requests_limit);
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Parse(format!("Failed to read response body: {}", e)))?;

        let raw_klines: Vec<serde_json::Value> = serde_json::from_str(&body)
            .map_err(|e| ApiError::Parse(format!("Failed to parse JSON: {}", e)))?;

        let candles = self.parse_klines_response(raw_klines)?;
        self.with_stats(|s| s.record_success(candles.len() as u64));

        info!("Fetched {} klines for {} {}", candles.len(), request.symbol, request.interval);
        Ok(candles)
    }

    /// Fetch klines with the adapter's bounded retry policy. Retry lives
    /// here, never in the aggregation pipeline.
    pub async fn fetch_klines_with_retry(&self, request: ApiRequest) -> Result<Vec<Candle>, ApiError> {
        let mut retries = 0;
        loop {
            match self.fetch_klines(request.clone()).await {
                Ok(candles) => return Ok(candles),
                Err(e) if e.is_rate_limit() => {
                    warn!("Rate limit hit, waiting before retry...");
                    sleep(Duration::from_millis(self.config.rate_limit_delay_ms * 2)).await;
                }
                Err(e) if e.is_recoverable() && retries < self.config.max_retries => {
                    retries += 1;
                    warn!("Retrying klines request ({}/{}): {}", retries, self.config.max_retries, e);
                    sleep(Duration::from_millis(1000 * retries as u64)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// List all symbols currently flagged tradable on spot
    pub async fn fetch_tradable_symbols(&self) -> Result<Vec<String>, ApiError> {
        let url = format!("{}{}", self.config.base_url, ApiEndpoint::ExchangeInfo.binance_path());
        let response = self.get(&url).await?;

        let info: ExchangeInfoResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(format!("Failed to parse exchange info: {}", e)))?;

        let mut symbols: Vec<String> = info
            .symbols
            .into_iter()
            .filter(|s| s.status == "TRADING" && s.is_spot_trading_allowed)
            .map(|s| s.symbol)
            .collect();
        symbols.sort();
        self.with_stats(|s| s.record_success(0));

        info!("Listed {} tradable spot symbols", symbols.len());
        Ok(symbols)
    }

    /// Latest traded price for a symbol
    pub async fn fetch_current_price(&self, symbol: &str) -> Result<f64, ApiError> {
        let url = format!(
            "{}{}?symbol={}",
            self.config.base_url,
            ApiEndpoint::TickerPrice.binance_path(),
            symbol
        );
        let response = self.get(&url).await?;

        let ticker: TickerPrice = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(format!("Failed to parse ticker: {}", e)))?;

        let price = ticker
            .price
            .parse::<f64>()
            .map_err(|_| ApiError::Parse(format!("Failed to parse '{}' as f64", ticker.price)))?;
        self.with_stats(|s| s.record_success(0));
        Ok(price)
    }

    /// Order book depth summed into a liquidity approximation
    pub async fn fetch_order_book_liquidity(
        &self,
        symbol: &str,
        limit: u32,
    ) -> Result<OrderBookLiquidity, ApiError> {
        let url = format!(
            "{}{}?symbol={}&limit={}",
            self.config.base_url,
            ApiEndpoint::Depth.binance_path(),
            symbol,
            limit
        );
        let response = self.get(&url).await?;

        let depth: DepthResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(format!("Failed to parse depth: {}", e)))?;

        let bid_liquidity = Self::sum_level_quantities(&depth.bids)?;
        let ask_liquidity = Self::sum_level_quantities(&depth.asks)?;
        self.with_stats(|s| s.record_success(0));

        Ok(OrderBookLiquidity {
            bid_liquidity,
            ask_liquidity,
            total_liquidity: bid_liquidity + ask_liquidity,
        })
    }

    fn sum_level_quantities(levels: &[[String; 2]]) -> Result<f64, ApiError> {
        let mut total = 0.0;
        for level in levels {
            total += level[1]
                .parse::<f64>()
                .map_err(|_| ApiError::Parse(format!("Failed to parse '{}' as f64", level[1])))?;
        }
        Ok(total)
    }

    /// Issue a throttled GET and map HTTP-level failures
    async fn get(&self, url: &str) -> Result<reqwest::Response, ApiError> {
        self.with_stats(|s| s.record_request());

        // Rate limiting: ensure minimum interval between requests
        {
            let mut last_request = self.last_request_time.lock().await;
            if let Some(last) = *last_request {
                let min_interval = Duration::from_millis(self.config.rate_limit_delay_ms);
                let elapsed = last.elapsed();
                if elapsed < min_interval {
                    let delay = min_interval - elapsed;
                    debug!("Rate limiting: waiting {:?} before next request", delay);
                    sleep(delay).await;
                }
            }
            *last_request = Some(Instant::now());
        }

        let response = self.client.get(url).send().await.map_err(|e| {
            self.with_stats(|s| s.record_failure());
            ApiError::Network(format!("Request failed: {}", e))
        })?;

        if response.status().as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);

            self.with_stats(|s| s.record_rate_limit());
            return Err(ApiError::RateLimit(format!(
                "Rate limit exceeded, retry after {} seconds",
                retry_after
            )));
        }

        if !response.status().is_success() {
            self.with_stats(|s| s.record_failure());
            return Err(ApiError::Http(format!(
                "HTTP {}: {}",
                response.status(),
                response.status().canonical_reason().unwrap_or("Unknown")
            )));
        }

        Ok(response)
    }

    /// Build the complete URL for klines request
    fn build_klines_url(&self, request: &ApiRequest) -> String {
        let mut url = format!(
            "{}{}?symbol={}&interval={}",
            self.config.base_url,
            request.endpoint.binance_path(),
            request.symbol,
            request.interval
        );

        if let Some(start_time) = request.start_time {
            url.push_str(&format!("&startTime={}", start_time));
        }

        if let Some(end_time) = request.end_time {
            url.push_str(&format!("&endTime={}", end_time));
        }

        if let Some(limit) = request.limit {
            // Binance allows max 1000 klines per request
            let limit = std::cmp::min(limit, 1000);
            url.push_str(&format!("&limit={}", limit));
        }

        url
    }

    /// Parse the spot klines tuple array into candles
    fn parse_klines_response(
        &self,
        raw_klines: Vec<serde_json::Value>,
    ) -> Result<Vec<Candle>, ApiError> {
        let mut candles = Vec::with_capacity(raw_klines.len());

        for kline_array in raw_klines {
            let array = kline_array
                .as_array()
                .ok_or_else(|| ApiError::Parse("Expected kline to be an array".to_string()))?;

            if array.len() < 7 {
                return Err(ApiError::Parse(format!(
                    "Expected at least 7 elements in kline array, got {}",
                    array.len()
                )));
            }

            let candle = Candle {
                open_time: self.parse_timestamp(&array[0])?,
                open: self.parse_f64(&array[1])?,
                high: self.parse_f64(&array[2])?,
                low: self.parse_f64(&array[3])?,
                close: self.parse_f64(&array[4])?,
                volume: self.parse_f64(&array[5])?,
                close_time: self.parse_timestamp(&array[6])?,
            };

            candles.push(candle);
        }

        Ok(candles)
    }

    /// Parse timestamp from JSON value
    fn parse_timestamp(&self, value: &serde_json::Value) -> Result<TimestampMS, ApiError> {
        value
            .as_i64()
            .ok_or_else(|| ApiError::Parse(format!("Expected timestamp to be i64, got: {:?}", value)))
    }

    /// Parse f64 from JSON value (spot klines encode numerics as strings)
    fn parse_f64(&self, value: &serde_json::Value) -> Result<f64, ApiError> {
        match value {
            serde_json::Value::String(s) => s
                .parse::<f64>()
                .map_err(|_| ApiError::Parse(format!("Failed to parse '{}' as f64", s))),
            serde_json::Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| ApiError::Parse(format!("Failed to convert number to f64: {:?}", n))),
            _ => Err(ApiError::Parse(format!("Expected string or number, got: {:?}", value))),
        }
    }

    /// Parse rate limit information from response headers
    fn parse_rate_limit_headers(&self, response: &reqwest::Response) -> Option<RateLimitInfo> {
        let headers = response.headers();

        let requests_used = headers
            .get("x-mbx-used-weight-1m")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.parse::<u32>().ok());

        let retry_after = headers
            .get("retry-after")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.parse::<u32>().ok());

        if requests_used.is_some() || retry_after.is_some() {
            Some(RateLimitInfo {
                requests_used: requests_used.unwrap_or(0),
                requests_limit: 1200, // Binance spot weight limit per minute
                retry_after,
            })
        } else {
            None
        }
    }
}
