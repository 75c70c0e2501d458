//! Server configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::str::FromStr;

use serde::Serialize;
use stockbook_core::report::DEFAULT_LOW_STOCK_THRESHOLD;

/// Secret used when `STOCKBOOK_JWT_SECRET` is unset. Fine for local use only.
pub const DEV_JWT_SECRET: &str = "stockbook-dev-secret-change-in-production";

/// Server configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,

    /// SQLite database file
    pub db_path: String,

    /// Secret for signing session tokens
    #[serde(skip_serializing)]
    pub jwt_secret: String,

    /// Session token lifetime in seconds
    pub jwt_lifetime_secs: i64,

    /// Items at or below this quantity count as low stock
    pub low_stock_threshold: i64,

    /// Shown in report headers
    pub business_name: Option<String>,

    /// Prefix for formatted amounts in reports
    pub currency_symbol: String,

    /// Allowed browser origin; unset allows any
    pub cors_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            http_port: 8080,
            db_path: "./stockbook.db".to_string(),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_lifetime_secs: 86_400,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            business_name: None,
            currency_symbol: "$".to_string(),
            cors_origin: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = ServerConfig::default();

        let config = ServerConfig {
            http_port: parse_var("STOCKBOOK_HTTP_PORT", defaults.http_port)?,

            db_path: env::var("STOCKBOOK_DB_PATH").unwrap_or(defaults.db_path),

            jwt_secret: env::var("STOCKBOOK_JWT_SECRET").unwrap_or(defaults.jwt_secret),

            jwt_lifetime_secs: parse_var("STOCKBOOK_JWT_LIFETIME_SECS", defaults.jwt_lifetime_secs)?,

            low_stock_threshold: parse_var(
                "STOCKBOOK_LOW_STOCK_THRESHOLD",
                defaults.low_stock_threshold,
            )?,

            business_name: optional_var("STOCKBOOK_BUSINESS_NAME"),

            currency_symbol: env::var("STOCKBOOK_CURRENCY_SYMBOL")
                .unwrap_or(defaults.currency_symbol),

            cors_origin: optional_var("STOCKBOOK_CORS_ORIGIN"),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("STOCKBOOK_JWT_SECRET".to_string()));
        }
        if self.jwt_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("STOCKBOOK_JWT_LIFETIME_SECS".to_string()));
        }
        if self.low_stock_threshold < 0 {
            return Err(ConfigError::InvalidValue("STOCKBOOK_LOW_STOCK_THRESHOLD".to_string()));
        }
        Ok(())
    }

    /// True when running with the built-in development secret.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name.to_string())),
        Err(_) => Ok(default),
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.jwt_lifetime_secs, 86_400);
        assert_eq!(config.low_stock_threshold, 5);
        assert!(config.uses_dev_secret());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = ServerConfig {
            jwt_lifetime_secs: 0,
            ..ServerConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));

        let config = ServerConfig {
            jwt_secret: "  ".to_string(),
            ..ServerConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::MissingRequired(_))));
    }

    #[test]
    fn test_secret_is_not_serialized() {
        let json = serde_json::to_string(&ServerConfig::default()).unwrap();
        assert!(!json.contains(DEV_JWT_SECRET));
    }
}
