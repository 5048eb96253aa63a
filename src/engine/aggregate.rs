use crate::domain::{Decimal, LedgerRow, MonthRef, MonthlySummary, PspName};
use crate::error::LedgerError;

/// Reduces a month of ledger rows into a [`MonthlySummary`].
pub struct MonthlyAggregator;

impl MonthlyAggregator {
    /// Flow totals are sums across rows. DEVİR and KASA TOP are running
    /// balances, so they are copied from the last row instead.
    ///
    /// # Errors
    /// Returns [`LedgerError::EmptyLedger`] when `rows` is empty.
    pub fn summarize(
        psp: PspName,
        month: MonthRef,
        rows: Vec<LedgerRow>,
    ) -> Result<MonthlySummary, LedgerError> {
        let Some(last) = rows.last() else {
            return Err(LedgerError::EmptyLedger { psp, month });
        };
        let devir = last.devir;
        let kasa_top = last.kasa_top;

        let total_deposits: Decimal = rows.iter().map(|r| r.deposits).sum();
        let total_withdrawals: Decimal = rows.iter().map(|r| r.withdrawals).sum();
        let total_toplam: Decimal = rows.iter().map(|r| r.toplam).sum();
        let total_commission: Decimal = rows.iter().map(|r| r.komisyon).sum();
        let total_net: Decimal = rows.iter().map(|r| r.net).sum();
        let total_tahs_tutari: Decimal = rows.iter().map(|r| r.tahs_tutari).sum();
        let transaction_count = rows.iter().map(|r| r.transaction_count).sum();
        let degraded_days = rows.iter().filter(|r| r.degraded).count();

        Ok(MonthlySummary {
            psp,
            month,
            total_deposits,
            total_withdrawals,
            total_toplam,
            total_commission,
            total_net,
            total_tahs_tutari,
            transaction_count,
            devir,
            kasa_top,
            degraded_days,
            rows,
        })
    }
}
