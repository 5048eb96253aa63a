//! Computed ledger values: daily rows, monthly summaries and cache entries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Decimal, MonthRef, PspName};

/// Where a day's DEVİR came from.
///
/// Only `Computed` values may be written to the DEVİR cache; an override stays
/// authoritative in the override store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "amount", rename_all = "lowercase")]
pub enum DevirSource {
    Override(Decimal),
    Computed(Decimal),
}

impl DevirSource {
    pub fn amount(&self) -> Decimal {
        match self {
            DevirSource::Override(amount) | DevirSource::Computed(amount) => *amount,
        }
    }

    pub fn is_override(&self) -> bool {
        matches!(self, DevirSource::Override(_))
    }
}

/// One PSP, one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRow {
    pub date: NaiveDate,
    pub psp: PspName,
    pub deposits: Decimal,
    pub withdrawals: Decimal,
    /// deposits - withdrawals
    pub toplam: Decimal,
    pub komisyon: Decimal,
    /// toplam - komisyon
    pub net: Decimal,
    pub tahs_tutari: Decimal,
    pub devir: Decimal,
    pub devir_source: DevirSource,
    /// devir + net
    pub kasa_top: Decimal,
    pub transaction_count: i64,
    /// Set when a source read failed and a default was substituted.
    pub degraded: bool,
}

impl LedgerRow {
    /// Cache triple for this row, unless its DEVİR came from an override.
    pub fn devir_entry(&self) -> Option<DevirEntry> {
        match self.devir_source {
            DevirSource::Override(_) => None,
            DevirSource::Computed(devir) => Some(DevirEntry {
                psp: self.psp.clone(),
                date: self.date,
                devir,
            }),
        }
    }
}

/// `(psp, date, devir)` triple handed to the DEVİR cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevirEntry {
    pub psp: PspName,
    pub date: NaiveDate,
    pub devir: Decimal,
}

/// One PSP, one month.
///
/// `devir` and `kasa_top` are the last day's values: both are running
/// quantities, so summing them across days is meaningless.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    pub psp: PspName,
    pub month: MonthRef,
    pub total_deposits: Decimal,
    pub total_withdrawals: Decimal,
    pub total_toplam: Decimal,
    pub total_commission: Decimal,
    pub total_net: Decimal,
    pub total_tahs_tutari: Decimal,
    pub transaction_count: i64,
    pub devir: Decimal,
    pub kasa_top: Decimal,
    pub degraded_days: usize,
    pub rows: Vec<LedgerRow>,
}
