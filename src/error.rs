use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::domain::{MonthRef, MonthRefError, PspName, PspNameError};

/// Errors visible to callers of the ledger service.
///
/// Source read and cache write failures are absorbed inside the engine and
/// never show up here.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Invalid range: {0}")]
    InvalidRange(#[from] MonthRefError),
    #[error("Invalid PSP: {0}")]
    InvalidPsp(#[from] PspNameError),
    #[error("No ledger rows for {psp} in {month}")]
    EmptyLedger { psp: PspName, month: MonthRef },
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<crate::datasource::DataSourceError> for AppError {
    fn from(err: crate::datasource::DataSourceError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InvalidRange(_) | LedgerError::InvalidPsp(_) => {
                AppError::BadRequest(err.to_string())
            }
            LedgerError::EmptyLedger { .. } => AppError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
