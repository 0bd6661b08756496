pub mod bucket;
pub mod classify;
pub mod errors;
pub mod quantile;

// Re-export commonly used types for convenience
pub use bucket::{aggregate, BucketKey, BucketMetrics, BucketMode, Direction};
pub use classify::{classify, ClassifiedBucket, ClassifiedView, ThresholdPair, Tier};
pub use errors::SeasonalityError;
pub use quantile::quantile;
