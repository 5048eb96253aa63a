//! Inputs to the daily fold: transaction flows, allocations, commission rates
//! and DEVİR overrides.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Decimal, PspName};

/// Deposit/withdrawal totals for one PSP on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyFlow {
    pub date: NaiveDate,
    /// Sum of deposit amounts (non-negative).
    pub deposits: Decimal,
    /// Sum of withdrawal magnitudes (non-negative).
    pub withdrawals: Decimal,
    pub transaction_count: i64,
}

impl DailyFlow {
    /// A day with no activity.
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            deposits: Decimal::zero(),
            withdrawals: Decimal::zero(),
            transaction_count: 0,
        }
    }

    /// Fold raw transactions for a single day into totals.
    pub fn from_transactions<'a>(
        date: NaiveDate,
        transactions: impl IntoIterator<Item = &'a PspTransaction>,
    ) -> Self {
        let mut flow = Self::empty(date);
        for tx in transactions {
            match tx.category {
                TransactionCategory::Deposit => flow.deposits += tx.amount.abs(),
                TransactionCategory::Withdrawal => flow.withdrawals += tx.amount.abs(),
            }
            flow.transaction_count += 1;
        }
        flow
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionCategory {
    Deposit,
    Withdrawal,
}

impl TransactionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionCategory::Deposit => "deposit",
            TransactionCategory::Withdrawal => "withdrawal",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "deposit" => Some(TransactionCategory::Deposit),
            "withdrawal" => Some(TransactionCategory::Withdrawal),
            _ => None,
        }
    }
}

/// A raw PSP transaction as recorded by the back office.
///
/// Withdrawals may be stored with either sign; flows always use the magnitude.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PspTransaction {
    pub psp: PspName,
    pub date: NaiveDate,
    pub category: TransactionCategory,
    pub amount: Decimal,
}

/// Manually recorded TAHS TUTARI for a PSP and day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub psp: PspName,
    pub date: NaiveDate,
    pub amount: Decimal,
}

/// Effective-dated commission rate. `effective_until` is inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionRate {
    pub psp: PspName,
    /// Decimal fraction, e.g. 0.15 for 15%.
    pub rate: Decimal,
    pub effective_from: NaiveDate,
    pub effective_until: Option<NaiveDate>,
}

impl CommissionRate {
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        date >= self.effective_from && self.effective_until.map_or(true, |until| date <= until)
    }
}

/// Authoritative replacement for the computed carry-in of a month's first day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevirOverride {
    pub psp: PspName,
    pub date: NaiveDate,
    pub amount: Decimal,
}
