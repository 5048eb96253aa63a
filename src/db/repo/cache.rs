//! The DEVİR cache table.

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, info};

use super::{date_key, parse_amount, Repository};
use crate::datasource::{CacheWriteStats, DataSourceError, DevirCache};
use crate::domain::{Decimal, DevirEntry, PspName};
use crate::engine::devir_cache::{plan_write, CacheAction};

impl Repository {
    pub async fn get_cached_devir(
        &self,
        psp: &PspName,
        date: NaiveDate,
    ) -> Result<Option<Decimal>, DataSourceError> {
        let raw: Option<(String,)> =
            sqlx::query_as("SELECT devir FROM devir_cache WHERE psp = ? AND ledger_date = ?")
                .bind(psp.as_str())
                .bind(date_key(date))
                .fetch_optional(&self.pool)
                .await?;
        raw.map(|(devir,)| parse_amount(&devir)).transpose()
    }
}

#[async_trait]
impl DevirCache for Repository {
    async fn write_devir_batch(
        &self,
        entries: &[DevirEntry],
    ) -> Result<CacheWriteStats, DataSourceError> {
        let mut stats = CacheWriteStats::default();
        if entries.is_empty() {
            return Ok(stats);
        }

        let now = chrono::Utc::now().timestamp_millis();
        let mut tx = self.pool.begin().await?;

        for entry in entries {
            let key = date_key(entry.date);
            let existing: Option<(String,)> =
                sqlx::query_as("SELECT devir FROM devir_cache WHERE psp = ? AND ledger_date = ?")
                    .bind(entry.psp.as_str())
                    .bind(&key)
                    .fetch_optional(&mut *tx)
                    .await?;

            let action = match existing {
                None => CacheAction::Insert,
                // An unreadable stored value is always replaced.
                Some((raw,)) => match parse_amount(&raw) {
                    Ok(stored) => plan_write(Some(stored), entry.devir, self.cache_epsilon),
                    Err(_) => CacheAction::Update,
                },
            };

            match action {
                CacheAction::Skip => {
                    stats.skipped += 1;
                    continue;
                }
                CacheAction::Insert => stats.inserted += 1,
                CacheAction::Update => stats.updated += 1,
            }

            sqlx::query(
                r#"
                INSERT INTO devir_cache (psp, ledger_date, devir, updated_at)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(psp, ledger_date) DO UPDATE SET
                    devir = excluded.devir,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(entry.psp.as_str())
            .bind(&key)
            .bind(entry.devir.to_canonical_string())
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(entries = entries.len(), "DEVİR cache batch committed");
        info!(
            inserted = stats.inserted,
            updated = stats.updated,
            skipped = stats.skipped,
            "DEVİR cache write complete"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_db;

    async fn repo() -> Repository {
        Repository::new(init_memory_db().await.expect("init_memory_db failed"))
    }

    fn entry(d: u32, devir: &str) -> DevirEntry {
        DevirEntry {
            psp: PspName::parse("PAPARA").unwrap(),
            date: NaiveDate::from_ymd_opt(2025, 3, d).unwrap(),
            devir: Decimal::from_str_canonical(devir).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_batch_inserts_then_skips_identical_values() {
        let repo = repo().await;
        let batch = vec![entry(1, "0"), entry(2, "400"), entry(3, "1000")];

        let first = repo.write_devir_batch(&batch).await.unwrap();
        assert_eq!(first.inserted, 3);

        let second = repo.write_devir_batch(&batch).await.unwrap();
        assert_eq!(
            second,
            CacheWriteStats {
                inserted: 0,
                updated: 0,
                skipped: 3
            }
        );
    }

    #[tokio::test]
    async fn test_epsilon_controls_updates() {
        let repo = repo().await;
        repo.write_devir_batch(&[entry(2, "400")]).await.unwrap();

        let stats = repo.write_devir_batch(&[entry(2, "400.005")]).await.unwrap();
        assert_eq!(stats.skipped, 1);

        let stats = repo.write_devir_batch(&[entry(2, "401")]).await.unwrap();
        assert_eq!(stats.updated, 1);

        let psp = PspName::parse("PAPARA").unwrap();
        let stored = repo
            .get_cached_devir(&psp, NaiveDate::from_ymd_opt(2025, 3, 2).unwrap())
            .await
            .unwrap();
        assert_eq!(stored, Some(Decimal::from_str_canonical("401").unwrap()));
    }

    #[tokio::test]
    async fn test_custom_epsilon() {
        let repo = repo()
            .await
            .with_cache_epsilon(Decimal::from_str_canonical("5").unwrap());
        repo.write_devir_batch(&[entry(2, "400")]).await.unwrap();

        let stats = repo.write_devir_batch(&[entry(2, "404")]).await.unwrap();
        assert_eq!(stats.skipped, 1);
    }

    #[tokio::test]
    async fn test_unreadable_stored_value_is_replaced() {
        let repo = repo().await;
        sqlx::query(
            r#"
            INSERT INTO devir_cache (psp, ledger_date, devir, updated_at)
            VALUES ('PAPARA', '2025-03-02', 'garbage', 0)
            "#,
        )
        .execute(repo.pool())
        .await
        .unwrap();

        let stats = repo.write_devir_batch(&[entry(2, "400")]).await.unwrap();
        assert_eq!(stats.updated, 1);
    }
}
