//! Console logging initialization for hosts embedding the explorer core.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize console logging with an env-filter default.
///
/// `RUST_LOG` takes precedence over the configured filter so operators can
/// raise verbosity without touching config.toml. Safe to call once per
/// process; returns an error string if a subscriber is already installed.
pub fn init_logging(level_filter: &str) -> Result<(), String> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_filter));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .try_init()
        .map_err(|e| format!("Failed to initialize logging: {}", e))
}
