//! Raw PSP transactions and the [`TransactionSource`] backed by them.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::Row;

use super::{date_key, parse_amount, Repository};
use crate::datasource::{DataSourceError, TransactionSource};
use crate::domain::{DailyFlow, PspName, PspTransaction, TransactionCategory};

impl Repository {
    /// Record a single transaction.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn insert_transaction(&self, tx: &PspTransaction) -> Result<(), sqlx::Error> {
        self.insert_transactions_batch(std::slice::from_ref(tx))
            .await
            .map(|_| ())
    }

    /// Insert multiple transactions in a single database transaction.
    ///
    /// # Errors
    /// Returns an error if the transaction fails.
    pub async fn insert_transactions_batch(
        &self,
        transactions: &[PspTransaction],
    ) -> Result<usize, sqlx::Error> {
        if transactions.is_empty() {
            return Ok(0);
        }

        let now = chrono::Utc::now().timestamp_millis();
        let mut db_tx = self.pool.begin().await?;
        for tx in transactions {
            sqlx::query(
                r#"
                INSERT INTO psp_transactions (psp, tx_date, category, amount, created_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(tx.psp.as_str())
            .bind(date_key(tx.date))
            .bind(tx.category.as_str())
            .bind(tx.amount.to_canonical_string())
            .bind(now)
            .execute(&mut *db_tx)
            .await?;
        }
        db_tx.commit().await?;

        Ok(transactions.len())
    }

    /// Transactions for one PSP and day, in insertion order.
    pub async fn query_transactions(
        &self,
        psp: &PspName,
        date: NaiveDate,
    ) -> Result<Vec<PspTransaction>, DataSourceError> {
        let rows = sqlx::query(
            r#"
            SELECT category, amount
            FROM psp_transactions
            WHERE psp = ? AND tx_date = ?
            ORDER BY id ASC
            "#,
        )
        .bind(psp.as_str())
        .bind(date_key(date))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let category: String = row.get("category");
                let amount: String = row.get("amount");
                let category = TransactionCategory::parse(&category).ok_or_else(|| {
                    DataSourceError::Corrupt(format!("unknown category {:?}", category))
                })?;
                Ok(PspTransaction {
                    psp: psp.clone(),
                    date,
                    category,
                    amount: parse_amount(&amount)?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl TransactionSource for Repository {
    async fn daily_flow(
        &self,
        psp: &PspName,
        date: NaiveDate,
    ) -> Result<DailyFlow, DataSourceError> {
        let transactions = self.query_transactions(psp, date).await?;
        Ok(DailyFlow::from_transactions(date, &transactions))
    }

    async fn list_psps(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PspName>, DataSourceError> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT psp
            FROM psp_transactions
            WHERE tx_date >= ? AND tx_date <= ?
            ORDER BY psp ASC
            "#,
        )
        .bind(date_key(from))
        .bind(date_key(to))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .filter_map(|row| PspName::parse(row.get::<&str, _>("psp")).ok())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_db;
    use crate::domain::Decimal;

    async fn repo() -> Repository {
        Repository::new(init_memory_db().await.expect("init_memory_db failed"))
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn tx(
        psp: &str,
        date: NaiveDate,
        category: TransactionCategory,
        amount: &str,
    ) -> PspTransaction {
        PspTransaction {
            psp: PspName::parse(psp).unwrap(),
            date,
            category,
            amount: Decimal::from_str_canonical(amount).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_daily_flow_sums_one_day() {
        let repo = repo().await;
        repo.insert_transactions_batch(&[
            tx("PAPARA", day(1), TransactionCategory::Deposit, "1000"),
            tx("PAPARA", day(1), TransactionCategory::Withdrawal, "-200"),
            tx("PAPARA", day(2), TransactionCategory::Deposit, "500"),
            tx("HAVALE", day(1), TransactionCategory::Deposit, "77"),
        ])
        .await
        .unwrap();

        let flow = repo
            .daily_flow(&PspName::parse("PAPARA").unwrap(), day(1))
            .await
            .unwrap();
        assert_eq!(flow.deposits, Decimal::from_str_canonical("1000").unwrap());
        assert_eq!(flow.withdrawals, Decimal::from_str_canonical("200").unwrap());
        assert_eq!(flow.transaction_count, 2);
    }

    #[tokio::test]
    async fn test_daily_flow_for_idle_day_is_empty() {
        let repo = repo().await;
        let flow = repo
            .daily_flow(&PspName::parse("PAPARA").unwrap(), day(5))
            .await
            .unwrap();
        assert_eq!(flow, DailyFlow::empty(day(5)));
    }

    #[tokio::test]
    async fn test_corrupt_amount_surfaces_as_error() {
        let repo = repo().await;
        sqlx::query(
            r#"
            INSERT INTO psp_transactions (psp, tx_date, category, amount, created_at)
            VALUES ('PAPARA', '2025-03-03', 'deposit', 'lots', 0)
            "#,
        )
        .execute(repo.pool())
        .await
        .unwrap();

        let result = repo
            .daily_flow(&PspName::parse("PAPARA").unwrap(), day(3))
            .await;
        assert!(matches!(result, Err(DataSourceError::Corrupt(_))));
    }

    #[tokio::test]
    async fn test_list_psps_in_window() {
        let repo = repo().await;
        repo.insert_transactions_batch(&[
            tx("PAPARA", day(3), TransactionCategory::Deposit, "1"),
            tx("HAVALE", day(31), TransactionCategory::Deposit, "1"),
            tx("PAPARA", day(4), TransactionCategory::Deposit, "1"),
            tx(
                "LATER",
                NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
                TransactionCategory::Deposit,
                "1",
            ),
        ])
        .await
        .unwrap();

        let names = repo.list_psps(day(1), day(31)).await.unwrap();
        let names: Vec<&str> = names.iter().map(|p| p.as_str()).collect();
        assert_eq!(names, vec!["HAVALE", "PAPARA"]);
    }
}
