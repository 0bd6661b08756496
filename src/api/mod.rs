pub mod binance;
pub mod types;

pub use binance::{BinanceSpotClient, OrderBookLiquidity};
pub use types::*;
