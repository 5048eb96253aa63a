//! Background writer for computed DEVİR values.

use std::sync::{Arc, Mutex};

use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::datasource::{CacheWriteStats, DevirCache};
use crate::domain::{DevirEntry, LedgerRow};

/// Hands finished folds' DEVİR values to a [`DevirCache`].
///
/// Failures are logged and swallowed; a ledger response never depends on the
/// cache. Submitted writes run as tracked tasks so [`flush`](Self::flush) can
/// drain them before shutdown.
#[derive(Debug)]
pub struct LedgerCacheWriter {
    cache: Arc<dyn DevirCache>,
    pending: Mutex<JoinSet<()>>,
}

impl LedgerCacheWriter {
    pub fn new(cache: Arc<dyn DevirCache>) -> Self {
        Self {
            cache,
            pending: Mutex::new(JoinSet::new()),
        }
    }

    /// Cache-eligible entries of a month: every row whose DEVİR was computed.
    pub fn entries_for(rows: &[LedgerRow]) -> Vec<DevirEntry> {
        rows.iter().filter_map(LedgerRow::devir_entry).collect()
    }

    /// Queue a batch without waiting for it.
    ///
    /// Writes that already finished are reaped first, so the pending set only
    /// holds writes still in flight.
    pub fn submit(&self, entries: Vec<DevirEntry>) {
        if entries.is_empty() {
            return;
        }
        let cache = Arc::clone(&self.cache);
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        while let Some(result) = pending.try_join_next() {
            if let Err(err) = result {
                warn!(error = %err, "DEVİR cache task did not complete");
            }
        }
        pending.spawn(async move {
            write_batch(cache.as_ref(), &entries).await;
        });
    }

    /// Wait for every submitted write to finish.
    pub async fn flush(&self) {
        let mut tasks = {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *pending)
        };

        let mut drained = 0usize;
        while let Some(result) = tasks.join_next().await {
            if let Err(err) = result {
                warn!(error = %err, "DEVİR cache task did not complete");
            }
            drained += 1;
        }
        debug!(drained, "DEVİR cache writes flushed");
    }
}

async fn write_batch(cache: &dyn DevirCache, entries: &[DevirEntry]) -> Option<CacheWriteStats> {
    match cache.write_devir_batch(entries).await {
        Ok(stats) => Some(stats),
        Err(err) => {
            warn!(
                entries = entries.len(),
                error = %err,
                "DEVİR cache write failed, ledger result unaffected"
            );
            None
        }
    }
}
