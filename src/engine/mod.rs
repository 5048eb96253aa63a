//! Computation engine for the PSP reconciliation ledger.
//!
//! - `rollover`: the per-day left fold (DEVİR / KASA TOP)
//! - `aggregate`: monthly reduction using last-day running balances
//! - `commission`: effective-dated rate selection
//! - `psp`: PSP category lookup (internal cash registers)
//! - `devir_cache`: insert/update/skip policy for the DEVİR cache

pub mod aggregate;
pub mod commission;
pub mod devir_cache;
pub mod psp;
pub mod rollover;

pub use aggregate::MonthlyAggregator;
pub use psp::{PspCategory, PspProfile, PspRegistry};
pub use rollover::{
    roll_day, roll_month, Carry, DailyRolloverCalculator, DayInputs, LedgerSources, RetryPolicy,
};
