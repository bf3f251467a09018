// Application configuration
// Read from the environment (and a `.env` file when present)

use std::env;
use std::time::Duration;
use thiserror::Error;

use crate::business_rules::config_store::DEFAULT_CACHE_TTL;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PORT must be a valid u16, got '{0}'")]
    InvalidPort(String),

    #[error("{name} must be a positive integer, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
}

/// Top-level configuration for the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Postgres connection string; the in-memory store is used when absent
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub settings_cache_ttl: Duration,
    pub db_max_connections: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = match lookup("PORT") {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(value))?,
            None => 8080,
        };

        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let settings_cache_ttl = match lookup("SETTINGS_CACHE_TTL_SECS") {
            Some(value) => Duration::from_secs(parse_number("SETTINGS_CACHE_TTL_SECS", &value)?),
            None => DEFAULT_CACHE_TTL,
        };

        let db_max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(value) => u32::try_from(parse_number("DB_MAX_CONNECTIONS", &value)?)
                .map_err(|_| ConfigError::InvalidNumber {
                    name: "DB_MAX_CONNECTIONS",
                    value,
                })?,
            None => 5,
        };

        Ok(Self {
            database_url,
            host,
            port,
            log_level,
            settings_cache_ttl,
            db_max_connections,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_number(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(number) if number > 0 => Ok(number),
        _ => Err(ConfigError::InvalidNumber {
            name,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.database_url, None);
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.settings_cache_ttl, DEFAULT_CACHE_TTL);
        assert_eq!(config.db_max_connections, 5);
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("DATABASE_URL", "postgres://pizza@localhost/pizzeria"),
            ("HOST", "127.0.0.1"),
            ("PORT", "3000"),
            ("SETTINGS_CACHE_TTL_SECS", "5"),
            ("DB_MAX_CONNECTIONS", "12"),
        ])
        .unwrap();
        assert_eq!(config.database_url.as_deref(), Some("postgres://pizza@localhost/pizzeria"));
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
        assert_eq!(config.settings_cache_ttl, Duration::from_secs(5));
        assert_eq!(config.db_max_connections, 12);
    }

    #[test]
    fn test_blank_database_url_means_in_memory() {
        assert_eq!(config(&[("DATABASE_URL", "  ")]).unwrap().database_url, None);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(config(&[("PORT", "eighty")]), Err(ConfigError::InvalidPort(_))));
        assert!(matches!(
            config(&[("SETTINGS_CACHE_TTL_SECS", "0")]),
            Err(ConfigError::InvalidNumber { .. })
        ));
    }
}
