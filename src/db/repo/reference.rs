//! Manually maintained reference data: TAHS TUTARI allocations, commission
//! rates and DEVİR overrides.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::Row;

use super::{date_key, parse_amount, parse_date, Repository};
use crate::datasource::{AllocationStore, CommissionRateResolver, DataSourceError, OverrideStore};
use crate::domain::{Allocation, CommissionRate, Decimal, DevirOverride, PspName};
use crate::engine::commission::select_rate;

impl Repository {
    /// Record the allocation for a PSP and day, replacing any previous value.
    pub async fn upsert_allocation(&self, allocation: &Allocation) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO psp_allocations (psp, alloc_date, amount, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(psp, alloc_date) DO UPDATE SET
                amount = excluded.amount,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(allocation.psp.as_str())
        .bind(date_key(allocation.date))
        .bind(allocation.amount.to_canonical_string())
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn insert_commission_rate(&self, rate: &CommissionRate) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO commission_rates (psp, rate, effective_from, effective_until)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(rate.psp.as_str())
        .bind(rate.rate.to_canonical_string())
        .bind(date_key(rate.effective_from))
        .bind(rate.effective_until.map(date_key))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Record a DEVİR override, replacing any previous value for that day.
    pub async fn upsert_devir_override(&self, entry: &DevirOverride) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO devir_overrides (psp, override_date, amount, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(psp, override_date) DO UPDATE SET
                amount = excluded.amount,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(entry.psp.as_str())
        .bind(date_key(entry.date))
        .bind(entry.amount.to_canonical_string())
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Rates for `psp` whose window may cover `date`.
    async fn candidate_rates(
        &self,
        psp: &PspName,
        date: NaiveDate,
    ) -> Result<Vec<CommissionRate>, DataSourceError> {
        let day = date_key(date);
        let rows = sqlx::query(
            r#"
            SELECT rate, effective_from, effective_until
            FROM commission_rates
            WHERE psp = ?
              AND effective_from <= ?
              AND (effective_until IS NULL OR effective_until >= ?)
            ORDER BY effective_from ASC, id ASC
            "#,
        )
        .bind(psp.as_str())
        .bind(&day)
        .bind(&day)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let until: Option<String> = row.get("effective_until");
                Ok(CommissionRate {
                    psp: psp.clone(),
                    rate: parse_amount(row.get("rate"))?,
                    effective_from: parse_date(row.get("effective_from"))?,
                    effective_until: until.as_deref().map(parse_date).transpose()?,
                })
            })
            .collect()
    }

    async fn single_amount(
        &self,
        sql: &str,
        psp: &PspName,
        date: NaiveDate,
    ) -> Result<Option<Decimal>, DataSourceError> {
        let raw: Option<(String,)> = sqlx::query_as(sql)
            .bind(psp.as_str())
            .bind(date_key(date))
            .fetch_optional(&self.pool)
            .await?;
        raw.map(|(amount,)| parse_amount(&amount)).transpose()
    }
}

#[async_trait]
impl AllocationStore for Repository {
    async fn allocation(
        &self,
        psp: &PspName,
        date: NaiveDate,
    ) -> Result<Option<Decimal>, DataSourceError> {
        self.single_amount(
            "SELECT amount FROM psp_allocations WHERE psp = ? AND alloc_date = ?",
            psp,
            date,
        )
        .await
    }
}

#[async_trait]
impl CommissionRateResolver for Repository {
    async fn resolve_rate(
        &self,
        psp: &PspName,
        date: NaiveDate,
    ) -> Result<Option<Decimal>, DataSourceError> {
        let rates = self.candidate_rates(psp, date).await?;
        Ok(select_rate(&rates, date))
    }
}

#[async_trait]
impl OverrideStore for Repository {
    async fn devir_override(
        &self,
        psp: &PspName,
        date: NaiveDate,
    ) -> Result<Option<Decimal>, DataSourceError> {
        self.single_amount(
            "SELECT amount FROM devir_overrides WHERE psp = ? AND override_date = ?",
            psp,
            date,
        )
        .await
    }
}
