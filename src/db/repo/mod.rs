//! Repository layer for database operations.
//!
//! This module provides the `Repository` struct for all database operations.
//! Methods are organized across submodules by table:
//! - `transactions.rs` - raw PSP transactions and the transaction source
//! - `reference.rs` - allocations, commission rates and DEVİR overrides
//! - `cache.rs` - the DEVİR cache

mod cache;
mod reference;
mod transactions;

use crate::datasource::DataSourceError;
use crate::domain::Decimal;
use crate::engine::devir_cache::DEFAULT_CACHE_EPSILON;
use chrono::NaiveDate;
use sqlx::sqlite::SqlitePool;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Repository for database operations.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
    cache_epsilon: Decimal,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository {
            pool,
            cache_epsilon: DEFAULT_CACHE_EPSILON,
        }
    }

    pub fn with_cache_epsilon(mut self, epsilon: Decimal) -> Self {
        self.cache_epsilon = epsilon;
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(raw: &str) -> Result<NaiveDate, DataSourceError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| DataSourceError::Corrupt(format!("invalid date {:?}: {}", raw, e)))
}

fn parse_amount(raw: &str) -> Result<Decimal, DataSourceError> {
    Decimal::from_str_canonical(raw)
        .map_err(|e| DataSourceError::Corrupt(format!("invalid decimal {:?}: {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_key_round_trip() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert_eq!(date_key(date), "2025-03-09");
        assert_eq!(parse_date("2025-03-09").unwrap(), date);
    }

    #[test]
    fn test_corrupt_values_are_reported() {
        assert!(matches!(
            parse_date("09/03/2025"),
            Err(DataSourceError::Corrupt(_))
        ));
        assert!(matches!(parse_amount("1.2.3"), Err(DataSourceError::Corrupt(_))));
    }
}
