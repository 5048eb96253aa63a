//! Database module for SQLite operations.
//!
//! This module provides:
//! - Database initialization and migrations
//! - The repository backing every ledger source and the DEVİR cache

pub mod migrations;
pub mod repo;

pub use migrations::{init_db, init_memory_db};
pub use repo::Repository;
