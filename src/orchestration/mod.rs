//! Request-level orchestration: validation, monthly folds and cache write-back.

pub mod cache_writer;
pub mod service;

pub use cache_writer::LedgerCacheWriter;
pub use service::LedgerService;
