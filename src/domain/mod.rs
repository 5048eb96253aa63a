//! Domain types for the PSP reconciliation ledger.
//!
//! This module provides:
//! - Lossless money arithmetic via the Decimal wrapper
//! - PSP names and validated calendar months
//! - Fold inputs: daily flows, allocations, commission rates, overrides
//! - Fold outputs: ledger rows, monthly summaries, DEVİR cache entries

pub mod decimal;
pub mod flow;
pub mod ledger;
pub mod primitives;

pub use decimal::Decimal;
pub use flow::{
    Allocation, CommissionRate, DailyFlow, DevirOverride, PspTransaction, TransactionCategory,
};
pub use ledger::{DevirEntry, DevirSource, LedgerRow, MonthlySummary};
pub use primitives::{
    is_month_start, MonthRef, MonthRefError, PspName, PspNameError, MAX_LEDGER_YEAR,
    MIN_LEDGER_YEAR,
};
