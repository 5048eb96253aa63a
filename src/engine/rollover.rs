//! Daily rollover calculator: the per-PSP, per-month left fold that produces
//! one ledger row per calendar day.
//!
//! The fold carries `(kasa_top, tahs_tutari)` from day `i - 1` into day `i`.
//! Days are never computed concurrently and never derived by walking history
//! backwards; only the four source reads inside a single day run concurrently.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use backoff::future::retry;
use backoff::ExponentialBackoff;
use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::datasource::{
    AllocationStore, CommissionRateResolver, DataSourceError, OverrideStore, TransactionSource,
};
use crate::domain::{is_month_start, DailyFlow, Decimal, DevirSource, LedgerRow, MonthRef};
use crate::engine::psp::PspProfile;

/// Source values for one day, after defaults were substituted for failed reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayInputs {
    pub flow: DailyFlow,
    pub allocation: Decimal,
    pub rate: Decimal,
    pub devir_override: Option<Decimal>,
    pub degraded: bool,
}

impl DayInputs {
    pub fn idle(date: NaiveDate) -> Self {
        Self {
            flow: DailyFlow::empty(date),
            allocation: Decimal::zero(),
            rate: Decimal::zero(),
            devir_override: None,
            degraded: false,
        }
    }
}

/// State handed from one day to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Carry {
    pub kasa_top: Decimal,
    pub tahs_tutari: Decimal,
}

impl Carry {
    /// DEVİR entering the following day.
    pub fn devir(&self) -> Decimal {
        self.kasa_top - self.tahs_tutari
    }
}

/// Compute one day of the fold.
///
/// `carry` is `None` only for the first day of the month; a first-of-month
/// date ignores any carry and opens from the override (or zero).
pub fn roll_day(
    profile: &PspProfile,
    inputs: &DayInputs,
    carry: Option<Carry>,
) -> (LedgerRow, Carry) {
    let date = inputs.flow.date;
    let internal = profile.is_internal_ledger();

    let deposits = inputs.flow.deposits;
    let withdrawals = inputs.flow.withdrawals;
    let toplam = deposits - withdrawals;
    let komisyon = if internal {
        Decimal::zero()
    } else {
        deposits * inputs.rate
    };
    let net = toplam - komisyon;

    let tahs_tutari = if internal {
        Decimal::zero()
    } else {
        inputs.allocation
    };

    let devir_source = if internal {
        DevirSource::Computed(Decimal::zero())
    } else {
        match (is_month_start(date), carry) {
            (false, Some(prev)) => DevirSource::Computed(prev.devir()),
            _ => inputs
                .devir_override
                .map_or(DevirSource::Computed(Decimal::zero()), DevirSource::Override),
        }
    };
    let devir = devir_source.amount();
    let kasa_top = devir + net;

    let row = LedgerRow {
        date,
        psp: profile.name.clone(),
        deposits,
        withdrawals,
        toplam,
        komisyon,
        net,
        tahs_tutari,
        devir,
        devir_source,
        kasa_top,
        transaction_count: inputs.flow.transaction_count,
        degraded: inputs.degraded,
    };

    (
        row,
        Carry {
            kasa_top,
            tahs_tutari,
        },
    )
}

/// Fold pre-fetched inputs for a whole month. Inputs must be ascending by date.
pub fn roll_month(profile: &PspProfile, days: &[DayInputs]) -> Vec<LedgerRow> {
    let mut carry = None;
    days.iter()
        .map(|inputs| {
            let (row, next) = roll_day(profile, inputs, carry);
            carry = Some(next);
            row
        })
        .collect()
}

/// The external stores the calculator reads from.
#[derive(Debug, Clone)]
pub struct LedgerSources {
    pub transactions: Arc<dyn TransactionSource>,
    pub allocations: Arc<dyn AllocationStore>,
    pub rates: Arc<dyn CommissionRateResolver>,
    pub overrides: Arc<dyn OverrideStore>,
}

impl LedgerSources {
    /// Use one store for all four reads.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: TransactionSource + AllocationStore + CommissionRateResolver + OverrideStore + 'static,
    {
        Self {
            transactions: store.clone(),
            allocations: store.clone(),
            rates: store.clone(),
            overrides: store,
        }
    }
}

/// Retry budget for source reads.
///
/// `max_elapsed` bounds a single read in [`DailyRolloverCalculator::fetch_day`]
/// and all reads of a month in [`DailyRolloverCalculator::compute_month`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub initial_interval: Duration,
    pub max_elapsed: Duration,
}

impl RetryPolicy {
    pub fn new(max_elapsed: Duration) -> Self {
        Self {
            initial_interval: Duration::from_millis(50),
            max_elapsed,
        }
    }

    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self::new(Duration::ZERO)
    }

    /// The same policy, cut down to whatever budget remains before `deadline`.
    fn until(&self, deadline: Instant) -> Self {
        Self {
            initial_interval: self.initial_interval,
            max_elapsed: deadline.saturating_duration_since(Instant::now()),
        }
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.initial_interval,
            max_elapsed_time: Some(self.max_elapsed),
            ..Default::default()
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(2))
    }
}

#[derive(Debug)]
pub struct DailyRolloverCalculator {
    sources: LedgerSources,
    retry: RetryPolicy,
}

impl DailyRolloverCalculator {
    pub fn new(sources: LedgerSources, retry: RetryPolicy) -> Self {
        Self { sources, retry }
    }

    pub fn transactions(&self) -> &Arc<dyn TransactionSource> {
        &self.sources.transactions
    }

    /// Produce exactly one row per calendar day of `month`, ascending.
    ///
    /// Source failures never abort the month: the failing read falls back to
    /// its default and the row is flagged `degraded`. Retries share one budget
    /// for the whole month; once it is spent every read gets a single attempt.
    pub async fn compute_month(&self, profile: &PspProfile, month: MonthRef) -> Vec<LedgerRow> {
        let mut rows = Vec::with_capacity(month.days_in_month() as usize);
        let mut carry: Option<Carry> = None;
        let deadline = Instant::now() + self.retry.max_elapsed;

        for date in month.days() {
            let inputs = self.read_day(profile, date, self.retry.until(deadline)).await;
            let (row, next) = roll_day(profile, &inputs, carry);
            carry = Some(next);
            rows.push(row);
        }

        debug!(
            psp = %profile.name,
            month = %month,
            rows = rows.len(),
            degraded = rows.iter().filter(|r| r.degraded).count(),
            "Computed monthly rollover"
        );
        rows
    }

    /// Read all inputs for one day concurrently, substituting defaults on failure.
    pub async fn fetch_day(&self, profile: &PspProfile, date: NaiveDate) -> DayInputs {
        self.read_day(profile, date, self.retry).await
    }

    async fn read_day(
        &self,
        profile: &PspProfile,
        date: NaiveDate,
        policy: RetryPolicy,
    ) -> DayInputs {
        let psp = &profile.name;
        let internal = profile.is_internal_ledger();
        let wants_override = !internal && is_month_start(date);

        let flow = self.read(policy, || self.sources.transactions.daily_flow(psp, date));
        let allocation = async {
            if internal {
                Ok(None)
            } else {
                self.read(policy, || self.sources.allocations.allocation(psp, date)).await
            }
        };
        let rate = async {
            if internal {
                Ok(None)
            } else {
                self.read(policy, || self.sources.rates.resolve_rate(psp, date)).await
            }
        };
        let devir_override = async {
            if wants_override {
                self.read(policy, || self.sources.overrides.devir_override(psp, date)).await
            } else {
                Ok(None)
            }
        };

        let (flow, allocation, rate, devir_override) =
            tokio::join!(flow, allocation, rate, devir_override);

        let mut inputs = DayInputs::idle(date);
        match flow {
            Ok(flow) => inputs.flow = flow,
            Err(err) => inputs.degraded |= log_fallback("daily_flow", profile, date, &err),
        }
        match allocation {
            Ok(amount) => inputs.allocation = amount.unwrap_or_default(),
            Err(err) => inputs.degraded |= log_fallback("allocation", profile, date, &err),
        }
        match rate {
            Ok(rate) => inputs.rate = rate.unwrap_or_default(),
            Err(err) => inputs.degraded |= log_fallback("commission_rate", profile, date, &err),
        }
        match devir_override {
            Ok(amount) => inputs.devir_override = amount,
            Err(err) => inputs.degraded |= log_fallback("devir_override", profile, date, &err),
        }
        inputs
    }

    async fn read<T, F, Fut>(&self, policy: RetryPolicy, op: F) -> Result<T, DataSourceError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, DataSourceError>>,
    {
        let op = &op;
        retry(policy.backoff(), move || async move {
            op().await.map_err(|err| {
                if err.is_transient() {
                    backoff::Error::transient(err)
                } else {
                    backoff::Error::permanent(err)
                }
            })
        })
        .await
    }
}

fn log_fallback(read: &str, profile: &PspProfile, date: NaiveDate, err: &DataSourceError) -> bool {
    warn!(
        psp = %profile.name,
        date = %date,
        read,
        error = %err,
        "Source read failed, substituting default for this day"
    );
    true
}
