//! Market seasonality explorer core: turns raw OHLCV candle series into
//! calendar buckets classified by volatility and volume tertiles, ready for
//! a calendar UI to render.
//!
//! Data flows one way: candles from the spot API adapter, through the bucket
//! aggregator, into the threshold classifier, out to the presentation
//! mapper. The view actor drives one render cycle at a time and discards
//! results that a newer request has superseded.

pub mod api;
pub mod config;
pub mod logging;
pub mod market;
pub mod presentation;
pub mod seasonality;
pub mod view;

pub use api::{ApiConfig, ApiError, BinanceSpotClient};
pub use config::ExplorerConfig;
pub use market::{Candle, Interval, SeriesProvider};
pub use seasonality::{
    aggregate, classify, quantile, BucketKey, BucketMetrics, BucketMode, ClassifiedBucket,
    ClassifiedView, Direction, SeasonalityError, ThresholdPair, Tier,
};
pub use view::{build_view, CalendarViewActor, ViewRequest, ViewState};
