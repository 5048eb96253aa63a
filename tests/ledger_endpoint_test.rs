use axum::http::StatusCode;
use chrono::NaiveDate;
use psp_ledger::api::{self, AppState};
use psp_ledger::config::Config;
use psp_ledger::datasource::MockLedgerSource;
use psp_ledger::engine::{DailyRolloverCalculator, LedgerSources, PspRegistry, RetryPolicy};
use psp_ledger::orchestration::{LedgerCacheWriter, LedgerService};
use psp_ledger::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
}

fn setup_test_app(mock: MockLedgerSource) -> axum::Router {
    let config = Config {
        port: 0,
        database_path: ":memory:".to_string(),
        internal_psps: vec!["TETHER".to_string()],
        cache_epsilon: Decimal::from_str_canonical("0.01").unwrap(),
        source_retry_max: Duration::ZERO,
        ledger_psps: vec!["HAVALE".to_string()],
    };

    let store = Arc::new(mock);
    let calculator = DailyRolloverCalculator::new(
        LedgerSources::from_store(store.clone()),
        RetryPolicy::none(),
    );
    let service = LedgerService::new(
        calculator,
        PspRegistry::new(&config.internal_psps),
        LedgerCacheWriter::new(store),
    )
    .with_default_psps(config.ledger_psps.clone());

    api::create_router(AppState::new(Arc::new(service), config))
}

fn scenario_a() -> MockLedgerSource {
    MockLedgerSource::new()
        .with_rate("PAPARA", "0.10", day(1), None)
        .with_flow("PAPARA", day(1), "1000", "200", 2)
        .with_allocation("PAPARA", day(1), "300")
        .with_flow("PAPARA", day(2), "500", "0", 1)
}

async fn request(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method("GET")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health_endpoint() {
    let (status, body) = request(setup_test_app(MockLedgerSource::new()), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_ready_endpoint_lists_internal_psps() {
    let (status, body) = request(setup_test_app(MockLedgerSource::new()), "/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["internalPsps"], serde_json::json!(["TETHER"]));
}

#[tokio::test]
async fn test_monthly_ledger_endpoint() {
    let app = setup_test_app(scenario_a());
    let (status, body) = request(app, "/v1/ledger/monthly?psp=PAPARA&year=2025&month=3").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["psp"], "PAPARA");
    assert_eq!(body["year"], 2025);
    assert_eq!(body["month"], 3);
    assert_eq!(body["totalDeposits"], "1500");
    assert_eq!(body["totalCommission"], "150");
    assert_eq!(body["devir"], "850");
    assert_eq!(body["kasaTop"], "850");

    let rows = body["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 31);
    assert_eq!(rows[0]["date"], "2025-03-01");
    assert_eq!(rows[0]["toplam"], "800");
    assert_eq!(rows[0]["tahsTutari"], "300");
    assert_eq!(rows[1]["devir"], "400");
    assert_eq!(rows[1]["kasaTop"], "850");
    assert_eq!(rows[1]["devirOverridden"], false);
}

#[tokio::test]
async fn test_invalid_month_returns_400() {
    let app = setup_test_app(MockLedgerSource::new());
    let (status, body) = request(app, "/v1/ledger/monthly?psp=PAPARA&year=2025&month=13").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("13"));
}

#[tokio::test]
async fn test_blank_psp_returns_400() {
    let app = setup_test_app(MockLedgerSource::new());
    let (status, body) = request(app, "/v1/ledger/monthly?psp=&year=2025&month=3").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let app = setup_test_app(MockLedgerSource::new());
    let (status, _) = request(app, "/v1/ledger/monthly?year=2025&month=3").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_report_with_named_psps() {
    let app = setup_test_app(scenario_a());
    let uri = "/v1/ledger/report?year=2025&month=3&psps=PAPARA,%20TETHER";
    let (status, body) = request(app, uri).await;

    assert_eq!(status, StatusCode::OK);
    let ledgers = body["ledgers"].as_array().unwrap();
    assert_eq!(ledgers.len(), 2);
    assert_eq!(ledgers[0]["psp"], "PAPARA");
    assert_eq!(ledgers[0]["kasaTop"], "850");
    assert_eq!(ledgers[1]["psp"], "TETHER");
    assert_eq!(ledgers[1]["kasaTop"], "0");
}

#[tokio::test]
async fn test_report_defaults() {
    let app = setup_test_app(scenario_a());
    let (status, body) = request(app, "/v1/ledger/report?year=2025&month=3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ledgers"][0]["psp"], "PAPARA");

    // No activity in April, so the configured list is used.
    let app = setup_test_app(scenario_a());
    let (status, body) = request(app, "/v1/ledger/report?year=2025&month=4").await;
    assert_eq!(status, StatusCode::OK);
    let ledgers = body["ledgers"].as_array().unwrap();
    assert_eq!(ledgers.len(), 1);
    assert_eq!(ledgers[0]["psp"], "HAVALE");
    assert_eq!(ledgers[0]["rows"].as_array().unwrap().len(), 30);
}

#[tokio::test]
async fn test_report_invalid_month_returns_400() {
    let app = setup_test_app(MockLedgerSource::new());
    let (status, body) = request(app, "/v1/ledger/report?year=2025&month=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}
