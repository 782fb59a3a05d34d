//! CLI configuration
//!
//! Sources, lowest precedence first: an optional file named by `--config`,
//! `config/default`, `config/local`, then `TENANTPAY__`-prefixed environment
//! variables (`TENANTPAY__LEDGER__DEFAULT_FEE_RATE=0.025`). Flags passed on
//! the command line are applied on top by `main`.

use serde::{Deserialize, Serialize};

use tenantpay_db::DatabaseConfig;
use tenantpay_ledger::LedgerConfig;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub ledger: LedgerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load(config_path: Option<&str>) -> anyhow::Result<Self> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let mut builder = config::Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        builder = builder
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("TENANTPAY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?.try_deserialize()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.ledger.default_fee_rate, dec!(0.029));
        assert_eq!(config.ledger.recent_limit, 10);
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config = config::Config::builder()
            .add_source(config::File::from_str(
                r#"
                [ledger]
                history_limit = 5

                [logging]
                format = "json"
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let app: AppConfig = config.try_deserialize().unwrap();

        assert_eq!(app.ledger.history_limit, 5);
        assert_eq!(app.ledger.currency, "INR");
        assert_eq!(app.logging.format, "json");
        assert_eq!(app.logging.level, "warn");
    }
}
