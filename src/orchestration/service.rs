//! Entry point for ledger computations.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use crate::config::Config;
use crate::datasource::DevirCache;
use crate::domain::{MonthRef, MonthlySummary, PspName};
use crate::engine::{
    DailyRolloverCalculator, LedgerSources, MonthlyAggregator, PspProfile, PspRegistry, RetryPolicy,
};
use crate::error::LedgerError;
use crate::orchestration::cache_writer::LedgerCacheWriter;

/// Validates requests, runs monthly folds and feeds the DEVİR cache.
#[derive(Debug)]
pub struct LedgerService {
    calculator: DailyRolloverCalculator,
    registry: PspRegistry,
    cache_writer: LedgerCacheWriter,
    default_psps: Vec<String>,
}

impl LedgerService {
    pub fn new(
        calculator: DailyRolloverCalculator,
        registry: PspRegistry,
        cache_writer: LedgerCacheWriter,
    ) -> Self {
        Self {
            calculator,
            registry,
            cache_writer,
            default_psps: Vec::new(),
        }
    }

    /// Wire a service from configuration and the stores it reads and caches into.
    pub fn from_config(
        config: &Config,
        sources: LedgerSources,
        cache: Arc<dyn DevirCache>,
    ) -> Self {
        let calculator =
            DailyRolloverCalculator::new(sources, RetryPolicy::new(config.source_retry_max));
        Self::new(
            calculator,
            PspRegistry::new(&config.internal_psps),
            LedgerCacheWriter::new(cache),
        )
        .with_default_psps(config.ledger_psps.clone())
    }

    /// PSPs reported when a report names none and the month has no activity.
    pub fn with_default_psps(mut self, psps: Vec<String>) -> Self {
        self.default_psps = psps;
        self
    }

    /// Compute the month's ledger for one PSP.
    ///
    /// # Errors
    /// [`LedgerError::InvalidRange`] for an impossible month or year and
    /// [`LedgerError::InvalidPsp`] for a blank PSP name. Source failures are
    /// absorbed into degraded rows.
    pub async fn compute_monthly_ledger(
        &self,
        psp: &str,
        year: i32,
        month: u32,
    ) -> Result<MonthlySummary, LedgerError> {
        let month = MonthRef::new(year, month)?;
        let psp = PspName::parse(psp)?;
        self.run(self.registry.profile(psp), month).await
    }

    /// Compute the month for several PSPs concurrently, in the order given.
    ///
    /// With no PSPs named, reports every PSP with transactions in the month,
    /// falling back to the configured default list.
    pub async fn compute_monthly_report(
        &self,
        psps: &[String],
        year: i32,
        month: u32,
    ) -> Result<Vec<MonthlySummary>, LedgerError> {
        let month = MonthRef::new(year, month)?;

        let names = if psps.is_empty() {
            self.psps_with_activity(month).await
        } else {
            psps.iter()
                .map(|raw| PspName::parse(raw))
                .collect::<Result<Vec<_>, _>>()?
        };

        let mut seen = HashSet::new();
        let folds = names
            .into_iter()
            .filter(|name| seen.insert(name.clone()))
            .map(|name| self.run(self.registry.profile(name), month));

        join_all(folds).await.into_iter().collect()
    }

    /// Drain pending cache writes.
    pub async fn shutdown(&self) {
        self.cache_writer.flush().await;
    }

    async fn psps_with_activity(&self, month: MonthRef) -> Vec<PspName> {
        let listed = self
            .calculator
            .transactions()
            .list_psps(month.first_day(), month.last_day())
            .await;

        match listed {
            Ok(names) if !names.is_empty() => names,
            Ok(_) => self.default_psp_names(),
            Err(err) => {
                warn!(month = %month, error = %err, "Could not list active PSPs, using defaults");
                self.default_psp_names()
            }
        }
    }

    fn default_psp_names(&self) -> Vec<PspName> {
        self.default_psps
            .iter()
            .filter_map(|raw| PspName::parse(raw).ok())
            .collect()
    }

    async fn run(
        &self,
        profile: PspProfile,
        month: MonthRef,
    ) -> Result<MonthlySummary, LedgerError> {
        let rows = self.calculator.compute_month(&profile, month).await;

        // Only a complete month reaches the cache.
        self.cache_writer.submit(LedgerCacheWriter::entries_for(&rows));

        let summary = MonthlyAggregator::summarize(profile.name, month, rows)?;
        if summary.degraded_days > 0 {
            info!(
                psp = %summary.psp,
                month = %month,
                degraded_days = summary.degraded_days,
                "Ledger computed with substituted source values"
            );
        }
        Ok(summary)
    }
}
