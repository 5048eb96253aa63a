use chrono::NaiveDate;
use tracing::warn;

use crate::domain::{CommissionRate, Decimal};

/// Pick the rate active on `date` from one PSP's effective-dated rates.
///
/// At most one rate should be active per date. When windows overlap, the rate
/// with the latest `effective_from` wins and the overlap is logged.
pub fn select_rate<'a>(
    rates: impl IntoIterator<Item = &'a CommissionRate>,
    date: NaiveDate,
) -> Option<Decimal> {
    let mut active: Vec<&CommissionRate> = rates
        .into_iter()
        .filter(|rate| rate.is_active_on(date))
        .collect();

    if active.len() > 1 {
        warn!(
            psp = %active[0].psp,
            date = %date,
            active = active.len(),
            "Overlapping commission rates, using the most recent effective_from"
        );
    }

    active.sort_by_key(|rate| rate.effective_from);
    active.last().map(|rate| rate.rate)
}
