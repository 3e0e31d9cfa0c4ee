//! Application configuration loaded from environment variables.

use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;

use crate::strategy::StrategyKind;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Market ===
    /// Condition id of the market to make.
    pub condition_id: String,

    // === CLOB Credentials ===
    /// Optional pre-generated API key.
    #[serde(default)]
    pub clob_api_key: Option<String>,

    /// Optional API secret.
    #[serde(default)]
    pub clob_api_secret: Option<String>,

    /// Optional API passphrase.
    #[serde(default)]
    pub clob_api_passphrase: Option<String>,

    /// CLOB API base URL.
    #[serde(default = "default_clob_url")]
    pub clob_api_url: String,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,

    // === Strategy ===
    /// Strategy to run: "amm" or "bands".
    #[serde(default = "default_strategy")]
    pub strategy: String,

    /// Path to the strategy's JSON config file.
    pub strategy_config: PathBuf,

    // === Timing ===
    /// Seconds between reconciliation ticks.
    #[serde(default = "default_sync_interval")]
    pub sync_interval_secs: u64,

    /// Seconds between snapshot cache refreshes.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    // === Server Configuration ===
    /// Port for the Prometheus metrics exporter.
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,
}

fn default_clob_url() -> String {
    "https://clob.polymarket.com".to_string()
}

fn default_http_timeout_ms() -> u64 {
    5000
}

fn default_strategy() -> String {
    "amm".to_string()
}

fn default_sync_interval() -> u64 {
    30
}

fn default_refresh_interval() -> u64 {
    5
}

fn default_metrics_port() -> u16 {
    9008
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.condition_id.is_empty() {
            return Err("CONDITION_ID is required".to_string());
        }

        if self.strategy_kind().is_err() {
            return Err(format!(
                "STRATEGY must be \"amm\" or \"bands\", got {:?}",
                self.strategy
            ));
        }

        if self.sync_interval_secs == 0 {
            return Err("SYNC_INTERVAL_SECS must be positive".to_string());
        }

        if self.refresh_interval_secs == 0 {
            return Err("REFRESH_INTERVAL_SECS must be positive".to_string());
        }

        Ok(())
    }

    /// Parse the configured strategy name.
    pub fn strategy_kind(&self) -> Result<StrategyKind, strum::ParseError> {
        StrategyKind::from_str(&self.strategy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            condition_id: "0xcondition".to_string(),
            clob_api_key: None,
            clob_api_secret: None,
            clob_api_passphrase: None,
            clob_api_url: default_clob_url(),
            http_timeout_ms: default_http_timeout_ms(),
            strategy: default_strategy(),
            strategy_config: PathBuf::from("amm.json"),
            sync_interval_secs: default_sync_interval(),
            refresh_interval_secs: default_refresh_interval(),
            metrics_port: default_metrics_port(),
            rust_log: default_log_level(),
        }
    }

    #[test]
    fn default_values_are_sensible() {
        assert_eq!(default_strategy(), "amm");
        assert_eq!(default_sync_interval(), 30);
        assert_eq!(default_refresh_interval(), 5);
        assert!(default_clob_url().starts_with("https://"));
    }

    #[test]
    fn valid_config_passes() {
        assert!(test_config().validate().is_ok());
        assert_eq!(test_config().strategy_kind().unwrap(), StrategyKind::Amm);
    }

    #[test]
    fn validate_rejects_empty_condition_id() {
        let config = Config {
            condition_id: String::new(),
            ..test_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_strategy() {
        let config = Config {
            strategy: "martingale".to_string(),
            ..test_config()
        };
        assert!(config.validate().is_err());
    }
}
