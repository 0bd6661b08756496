use thiserror::Error;

use crate::api::types::ApiError;

/// Error taxonomy for the aggregation/classification core.
///
/// `DataGap` is always recovered locally (the empty bucket is omitted and
/// logged); it never crosses the pipeline boundary. `InvalidArgument` is
/// fatal to the current computation only.
#[derive(Error, Debug)]
pub enum SeasonalityError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("No candles for bucket: {0}")]
    DataGap(String),
    #[error("Network error: {0}")]
    Network(#[from] ApiError),
}
