//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with one table:
//! - sources(id, filename UNIQUE, content, created_at, updated_at)

pub mod schema;
pub mod sqlite;

pub use sqlite::{SourceStore, StoreStats, DEFAULT_VALIDATION_TIMEOUT};
