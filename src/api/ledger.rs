use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::domain::{LedgerRow, MonthlySummary};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyLedgerQuery {
    #[serde(default)]
    pub psp: String,
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerReportQuery {
    pub year: i32,
    pub month: u32,
    /// Comma-separated PSP names.
    pub psps: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyLedgerResponse {
    pub psp: String,
    pub year: i32,
    pub month: u32,
    pub total_deposits: String,
    pub total_withdrawals: String,
    pub total_toplam: String,
    pub total_commission: String,
    pub total_net: String,
    pub total_tahs_tutari: String,
    pub transaction_count: i64,
    pub devir: String,
    pub kasa_top: String,
    pub degraded_days: usize,
    pub rows: Vec<LedgerRowDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRowDto {
    pub date: String,
    pub deposits: String,
    pub withdrawals: String,
    pub toplam: String,
    pub komisyon: String,
    pub net: String,
    pub tahs_tutari: String,
    pub devir: String,
    pub devir_overridden: bool,
    pub kasa_top: String,
    pub transaction_count: i64,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerReportResponse {
    pub year: i32,
    pub month: u32,
    pub ledgers: Vec<MonthlyLedgerResponse>,
}

impl From<&LedgerRow> for LedgerRowDto {
    fn from(row: &LedgerRow) -> Self {
        Self {
            date: row.date.format("%Y-%m-%d").to_string(),
            deposits: row.deposits.to_canonical_string(),
            withdrawals: row.withdrawals.to_canonical_string(),
            toplam: row.toplam.to_canonical_string(),
            komisyon: row.komisyon.to_canonical_string(),
            net: row.net.to_canonical_string(),
            tahs_tutari: row.tahs_tutari.to_canonical_string(),
            devir: row.devir.to_canonical_string(),
            devir_overridden: row.devir_source.is_override(),
            kasa_top: row.kasa_top.to_canonical_string(),
            transaction_count: row.transaction_count,
            degraded: row.degraded,
        }
    }
}

impl From<MonthlySummary> for MonthlyLedgerResponse {
    fn from(summary: MonthlySummary) -> Self {
        Self {
            psp: summary.psp.to_string(),
            year: summary.month.year(),
            month: summary.month.month(),
            total_deposits: summary.total_deposits.to_canonical_string(),
            total_withdrawals: summary.total_withdrawals.to_canonical_string(),
            total_toplam: summary.total_toplam.to_canonical_string(),
            total_commission: summary.total_commission.to_canonical_string(),
            total_net: summary.total_net.to_canonical_string(),
            total_tahs_tutari: summary.total_tahs_tutari.to_canonical_string(),
            transaction_count: summary.transaction_count,
            devir: summary.devir.to_canonical_string(),
            kasa_top: summary.kasa_top.to_canonical_string(),
            degraded_days: summary.degraded_days,
            rows: summary.rows.iter().map(LedgerRowDto::from).collect(),
        }
    }
}

pub async fn get_monthly_ledger(
    Query(params): Query<MonthlyLedgerQuery>,
    State(state): State<AppState>,
) -> Result<Json<MonthlyLedgerResponse>, AppError> {
    let summary = state
        .service
        .compute_monthly_ledger(&params.psp, params.year, params.month)
        .await?;

    Ok(Json(summary.into()))
}

pub async fn get_ledger_report(
    Query(params): Query<LedgerReportQuery>,
    State(state): State<AppState>,
) -> Result<Json<LedgerReportResponse>, AppError> {
    let psps: Vec<String> = params
        .psps
        .as_deref()
        .map(|raw| raw.split(',').map(|s| s.trim().to_string()).collect())
        .unwrap_or_default();

    let summaries = state
        .service
        .compute_monthly_report(&psps, params.year, params.month)
        .await?;

    Ok(Json(LedgerReportResponse {
        year: params.year,
        month: params.month,
        ledgers: summaries.into_iter().map(MonthlyLedgerResponse::from).collect(),
    }))
}
