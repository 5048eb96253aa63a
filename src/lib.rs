pub mod api;
pub mod config;
pub mod datasource;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;

pub use config::Config;
pub use datasource::{DataSourceError, MockLedgerSource};
pub use db::{init_db, Repository};
pub use domain::{Decimal, LedgerRow, MonthRef, MonthlySummary, PspName};
pub use error::{AppError, LedgerError};
pub use orchestration::LedgerService;
