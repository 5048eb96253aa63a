use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

use crate::domain::Decimal;
use crate::engine::devir_cache::DEFAULT_CACHE_EPSILON;
use crate::engine::psp::DEFAULT_INTERNAL_PSPS;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    /// PSPs treated as internal cash registers (no commission, no carry-forward).
    pub internal_psps: Vec<String>,
    /// DEVİR cache values closer than this to a new value are not rewritten.
    pub cache_epsilon: Decimal,
    /// Backoff budget for a single source read.
    pub source_retry_max: Duration,
    /// PSPs reported when a report request names none and the month has no activity.
    pub ledger_psps: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let internal_psps = match env_map.get("INTERNAL_PSPS") {
            Some(list) => parse_list(list),
            None => DEFAULT_INTERNAL_PSPS.iter().map(|s| s.to_string()).collect(),
        };

        let cache_epsilon = match env_map.get("CACHE_EPSILON") {
            Some(raw) => Decimal::from_str_canonical(raw)
                .ok()
                .filter(|eps| !eps.is_negative())
                .ok_or_else(|| {
                    ConfigError::InvalidValue(
                        "CACHE_EPSILON".to_string(),
                        "must be a non-negative decimal".to_string(),
                    )
                })?,
            None => DEFAULT_CACHE_EPSILON,
        };

        let source_retry_max = env_map
            .get("SOURCE_RETRY_MAX_MS")
            .map(|s| s.as_str())
            .unwrap_or("2000")
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "SOURCE_RETRY_MAX_MS".to_string(),
                    "must be a valid u64".to_string(),
                )
            })?;

        let ledger_psps = env_map
            .get("LEDGER_PSPS")
            .map(|list| parse_list(list))
            .unwrap_or_default();

        Ok(Config {
            port,
            database_path,
            internal_psps,
            cache_epsilon,
            source_retry_max,
            ledger_psps,
        })
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
