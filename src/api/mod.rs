pub mod health;
pub mod ledger;

use crate::config::Config;
use crate::orchestration::LedgerService;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<LedgerService>,
    pub config: Config,
}

impl AppState {
    pub fn new(service: Arc<LedgerService>, config: Config) -> Self {
        Self { service, config }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/ledger/monthly", get(ledger::get_monthly_ledger))
        .route("/v1/ledger/report", get(ledger::get_ledger_report))
        .layer(cors)
        .with_state(state)
}
