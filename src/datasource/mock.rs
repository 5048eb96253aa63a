//! In-memory ledger stores for tests, with per-day failure injection.

use super::{
    AllocationStore, CacheWriteStats, CommissionRateResolver, DataSourceError, DevirCache,
    OverrideStore, TransactionSource,
};
use crate::domain::{CommissionRate, DailyFlow, Decimal, DevirEntry, PspName};
use crate::engine::commission::select_rate;
use crate::engine::devir_cache::{plan_write, CacheAction, DEFAULT_CACHE_EPSILON};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex};

type Key = (PspName, NaiveDate);

/// Which read to fail in [`MockLedgerSource::failing_on`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockRead {
    Flow,
    Allocation,
    Rate,
    Override,
}

/// Mock store implementing every source trait plus the DEVİR cache.
///
/// Clones share the cache contents and the override lookup log, so a test can
/// hand one clone to the engine and inspect another.
#[derive(Debug, Clone)]
pub struct MockLedgerSource {
    flows: HashMap<Key, DailyFlow>,
    allocations: HashMap<Key, Decimal>,
    rates: Vec<CommissionRate>,
    overrides: HashMap<Key, Decimal>,
    failures: HashSet<(MockRead, NaiveDate)>,
    fail_cache_writes: bool,
    cache_epsilon: Decimal,
    cache: Arc<Mutex<HashMap<Key, Decimal>>>,
    override_lookups: Arc<Mutex<Vec<NaiveDate>>>,
}

fn psp(name: &str) -> PspName {
    PspName::parse(name).expect("mock PSP names must not be blank")
}

fn dec(value: &str) -> Decimal {
    Decimal::from_str_canonical(value).expect("mock amounts must be valid decimals")
}

impl MockLedgerSource {
    pub fn new() -> Self {
        Self {
            flows: HashMap::new(),
            allocations: HashMap::new(),
            rates: Vec::new(),
            overrides: HashMap::new(),
            failures: HashSet::new(),
            fail_cache_writes: false,
            cache_epsilon: DEFAULT_CACHE_EPSILON,
            cache: Arc::new(Mutex::new(HashMap::new())),
            override_lookups: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set the day's deposit/withdrawal totals.
    pub fn with_flow(
        mut self,
        name: &str,
        date: NaiveDate,
        deposits: &str,
        withdrawals: &str,
        transaction_count: i64,
    ) -> Self {
        self.flows.insert(
            (psp(name), date),
            DailyFlow {
                date,
                deposits: dec(deposits),
                withdrawals: dec(withdrawals),
                transaction_count,
            },
        );
        self
    }

    pub fn with_allocation(mut self, name: &str, date: NaiveDate, amount: &str) -> Self {
        self.allocations.insert((psp(name), date), dec(amount));
        self
    }

    pub fn with_rate(
        mut self,
        name: &str,
        rate: &str,
        effective_from: NaiveDate,
        effective_until: Option<NaiveDate>,
    ) -> Self {
        self.rates.push(CommissionRate {
            psp: psp(name),
            rate: dec(rate),
            effective_from,
            effective_until,
        });
        self
    }

    pub fn with_override(mut self, name: &str, date: NaiveDate, amount: &str) -> Self {
        self.overrides.insert((psp(name), date), dec(amount));
        self
    }

    /// Make the given read fail for every PSP on `date`.
    pub fn failing_on(mut self, read: MockRead, date: NaiveDate) -> Self {
        self.failures.insert((read, date));
        self
    }

    pub fn failing_cache_writes(mut self) -> Self {
        self.fail_cache_writes = true;
        self
    }

    pub fn with_cache_epsilon(mut self, epsilon: &str) -> Self {
        self.cache_epsilon = dec(epsilon);
        self
    }

    /// Pre-populate the DEVİR cache.
    pub fn with_cached_devir(self, name: &str, date: NaiveDate, devir: &str) -> Self {
        self.cache
            .lock()
            .expect("mock cache lock poisoned")
            .insert((psp(name), date), dec(devir));
        self
    }

    pub fn cached_devir(&self, name: &str, date: NaiveDate) -> Option<Decimal> {
        self.cache
            .lock()
            .expect("mock cache lock poisoned")
            .get(&(psp(name), date))
            .copied()
    }

    pub fn cache_len(&self) -> usize {
        self.cache.lock().expect("mock cache lock poisoned").len()
    }

    /// Dates the override store was asked about, in call order.
    pub fn override_lookups(&self) -> Vec<NaiveDate> {
        self.override_lookups
            .lock()
            .expect("mock lookup log poisoned")
            .clone()
    }

    fn check(&self, read: MockRead, date: NaiveDate) -> Result<(), DataSourceError> {
        if self.failures.contains(&(read, date)) {
            return Err(DataSourceError::Other(format!(
                "injected {:?} failure on {}",
                read, date
            )));
        }
        Ok(())
    }
}

impl Default for MockLedgerSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransactionSource for MockLedgerSource {
    async fn daily_flow(
        &self,
        psp: &PspName,
        date: NaiveDate,
    ) -> Result<DailyFlow, DataSourceError> {
        self.check(MockRead::Flow, date)?;
        Ok(self
            .flows
            .get(&(psp.clone(), date))
            .cloned()
            .unwrap_or_else(|| DailyFlow::empty(date)))
    }

    async fn list_psps(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PspName>, DataSourceError> {
        let names: BTreeSet<PspName> = self
            .flows
            .iter()
            .filter(|((_, date), flow)| *date >= from && *date <= to && flow.transaction_count > 0)
            .map(|((name, _), _)| name.clone())
            .collect();
        Ok(names.into_iter().collect())
    }
}

#[async_trait]
impl AllocationStore for MockLedgerSource {
    async fn allocation(
        &self,
        psp: &PspName,
        date: NaiveDate,
    ) -> Result<Option<Decimal>, DataSourceError> {
        self.check(MockRead::Allocation, date)?;
        Ok(self.allocations.get(&(psp.clone(), date)).copied())
    }
}

#[async_trait]
impl CommissionRateResolver for MockLedgerSource {
    async fn resolve_rate(
        &self,
        psp: &PspName,
        date: NaiveDate,
    ) -> Result<Option<Decimal>, DataSourceError> {
        self.check(MockRead::Rate, date)?;
        Ok(select_rate(self.rates.iter().filter(|r| &r.psp == psp), date))
    }
}

#[async_trait]
impl OverrideStore for MockLedgerSource {
    async fn devir_override(
        &self,
        psp: &PspName,
        date: NaiveDate,
    ) -> Result<Option<Decimal>, DataSourceError> {
        self.override_lookups
            .lock()
            .expect("mock lookup log poisoned")
            .push(date);
        self.check(MockRead::Override, date)?;
        Ok(self.overrides.get(&(psp.clone(), date)).copied())
    }
}

#[async_trait]
impl DevirCache for MockLedgerSource {
    async fn write_devir_batch(
        &self,
        entries: &[DevirEntry],
    ) -> Result<CacheWriteStats, DataSourceError> {
        if self.fail_cache_writes {
            return Err(DataSourceError::Unavailable("injected cache failure".to_string()));
        }

        let mut cache = self.cache.lock().expect("mock cache lock poisoned");
        let mut stats = CacheWriteStats::default();
        for entry in entries {
            let key = (entry.psp.clone(), entry.date);
            match plan_write(cache.get(&key).copied(), entry.devir, self.cache_epsilon) {
                CacheAction::Insert => {
                    cache.insert(key, entry.devir);
                    stats.inserted += 1;
                }
                CacheAction::Update => {
                    cache.insert(key, entry.devir);
                    stats.updated += 1;
                }
                CacheAction::Skip => stats.skipped += 1,
            }
        }
        Ok(stats)
    }
}
