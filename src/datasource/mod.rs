//! Store abstractions the ledger engine reads from and writes its DEVİR cache to.
//!
//! Every trait here is implemented by the SQLite [`Repository`](crate::db::Repository)
//! and by [`MockLedgerSource`] for tests.

use crate::domain::{DailyFlow, Decimal, DevirEntry, PspName};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::fmt;

pub mod mock;

pub use mock::MockLedgerSource;

/// Supplies per-day deposit and withdrawal totals.
#[async_trait]
pub trait TransactionSource: Send + Sync + fmt::Debug {
    /// Totals for `psp` on `date`; a day without transactions is all-zero, not an error.
    async fn daily_flow(&self, psp: &PspName, date: NaiveDate)
        -> Result<DailyFlow, DataSourceError>;

    /// PSPs with at least one transaction in `[from, to]`, sorted by name.
    async fn list_psps(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PspName>, DataSourceError>;
}

/// Supplies the manually recorded TAHS TUTARI.
#[async_trait]
pub trait AllocationStore: Send + Sync + fmt::Debug {
    async fn allocation(
        &self,
        psp: &PspName,
        date: NaiveDate,
    ) -> Result<Option<Decimal>, DataSourceError>;
}

/// Resolves the commission rate effective on a date.
#[async_trait]
pub trait CommissionRateResolver: Send + Sync + fmt::Debug {
    async fn resolve_rate(
        &self,
        psp: &PspName,
        date: NaiveDate,
    ) -> Result<Option<Decimal>, DataSourceError>;
}

/// Supplies manual DEVİR overrides. Only consulted for the first day of a month.
#[async_trait]
pub trait OverrideStore: Send + Sync + fmt::Debug {
    async fn devir_override(
        &self,
        psp: &PspName,
        date: NaiveDate,
    ) -> Result<Option<Decimal>, DataSourceError>;
}

/// Persists computed DEVİR values.
#[async_trait]
pub trait DevirCache: Send + Sync + fmt::Debug {
    /// Apply a batch: insert missing keys, update keys whose stored value moved
    /// by more than the cache epsilon, skip the rest.
    async fn write_devir_batch(
        &self,
        entries: &[DevirEntry],
    ) -> Result<CacheWriteStats, DataSourceError>;
}

/// Outcome counts of one cache batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheWriteStats {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// Error type for store reads and writes.
#[derive(Debug, Clone)]
pub enum DataSourceError {
    /// Store could not be reached (pool timeout, closed connection, ...)
    Unavailable(String),
    /// Stored data could not be decoded
    Corrupt(String),
    /// Other error
    Other(String),
}

impl DataSourceError {
    /// Whether retrying the same read might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, DataSourceError::Unavailable(_))
    }
}

impl fmt::Display for DataSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSourceError::Unavailable(msg) => write!(f, "Store unavailable: {}", msg),
            DataSourceError::Corrupt(msg) => write!(f, "Corrupt data: {}", msg),
            DataSourceError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for DataSourceError {}

impl From<sqlx::Error> for DataSourceError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DataSourceError::Unavailable(err.to_string())
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                DataSourceError::Corrupt(err.to_string())
            }
            other => DataSourceError::Other(other.to_string()),
        }
    }
}
