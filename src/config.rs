//! TOML configuration layer: typed optional sections converted into the
//! runtime configuration the host application hands to the client and actor.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::api::types::ApiConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// API section from config.toml
#[derive(Debug, Clone, Deserialize)]
struct ApiTomlConfig {
    pub base_url: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub max_retries: Option<u32>,
    pub rate_limit_delay_ms: Option<u64>,
}

/// View section from config.toml
#[derive(Debug, Clone, Deserialize)]
struct ViewTomlConfig {
    pub default_symbol: Option<String>,
    pub order_book_depth: Option<u32>,
}

/// Logging section from config.toml
#[derive(Debug, Clone, Deserialize)]
struct LoggingTomlConfig {
    pub level_filter: Option<String>,
}

/// Full TOML configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
struct TomlConfig {
    pub api: Option<ApiTomlConfig>,
    pub view: Option<ViewTomlConfig>,
    pub logging: Option<LoggingTomlConfig>,
}

/// Runtime configuration (converted from TOML)
#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    pub api: ApiConfig,
    pub default_symbol: String,
    pub order_book_depth: u32,
    pub level_filter: String,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::binance_spot(),
            default_symbol: "BTCUSDT".to_string(),
            order_book_depth: 10,
            level_filter: "info,seasonality_explorer=info".to_string(),
        }
    }
}

impl ExplorerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let toml_config: TomlConfig = toml::from_str(content)?;
        Ok(Self::from_toml(toml_config))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    fn from_toml(toml_config: TomlConfig) -> Self {
        let defaults = Self::default();

        let api = match toml_config.api {
            Some(section) => ApiConfig {
                base_url: section.base_url.unwrap_or(defaults.api.base_url),
                timeout_seconds: section.timeout_seconds.unwrap_or(defaults.api.timeout_seconds),
                max_retries: section.max_retries.unwrap_or(defaults.api.max_retries),
                rate_limit_delay_ms: section
                    .rate_limit_delay_ms
                    .unwrap_or(defaults.api.rate_limit_delay_ms),
            },
            None => defaults.api,
        };

        let (default_symbol, order_book_depth) = match toml_config.view {
            Some(section) => (
                section.default_symbol.unwrap_or(defaults.default_symbol),
                section.order_book_depth.unwrap_or(defaults.order_book_depth),
            ),
            None => (defaults.default_symbol, defaults.order_book_depth),
        };

        let level_filter = toml_config
            .logging
            .and_then(|section| section.level_filter)
            .unwrap_or(defaults.level_filter);

        Self { api, default_symbol, order_book_depth, level_filter }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ExplorerConfig::from_toml_str("").unwrap();
        assert_eq!(config.default_symbol, "BTCUSDT");
        assert_eq!(config.api.base_url, "https://api.binance.com");
        assert_eq!(config.order_book_depth, 10);
    }

    #[test]
    fn test_partial_sections_override_defaults() {
        let content = r#"
            [api]
            base_url = "https://testnet.binance.vision"

            [view]
            default_symbol = "ETHUSDT"

            [logging]
            level_filter = "debug"
        "#;
        let config = ExplorerConfig::from_toml_str(content).unwrap();
        assert_eq!(config.api.base_url, "https://testnet.binance.vision");
        assert_eq!(config.api.timeout_seconds, 30);
        assert_eq!(config.default_symbol, "ETHUSDT");
        assert_eq!(config.level_filter, "debug");
    }

    #[test]
    fn test_malformed_toml_is_rejected() {
        assert!(ExplorerConfig::from_toml_str("[api\nbase_url = 1").is_err());
    }
}
