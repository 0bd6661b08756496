pub mod provider;
pub mod structs;

pub use provider::SeriesProvider;
pub use structs::{Candle, Interval, TimeRange, TimestampMS};
