//! # tfsource - Validated Infrastructure Source Store
//!
//! Keeps infrastructure-definition files (Terraform `.tf` documents and
//! friends) as source records that are always known to be valid.
//!
//! tfsource provides:
//! - Path normalization from an import base directory to a logical filename
//! - A pluggable external validator (the `terraform` CLI by default)
//! - SQLite-backed storage with a unique logical filename per record
//! - Importers and exporters between the filesystem and the store
//! - A CLI and a small JSON HTTP adapter over the same operations

pub mod path;
pub mod source;
pub mod validator;
pub mod storage;
pub mod import;
pub mod export;
pub mod timeout;
pub mod filter;
pub mod server;
pub mod output;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use source::{Source, SourceDraft};
pub use validator::{CachedValidator, CommandValidator, RecordingValidator, Validator, Verdict};
pub use storage::SourceStore;
pub use import::{ImportReport, SourceImporter};
pub use export::SourceExporter;

use std::path::PathBuf;
use std::time::Duration;

/// Result type alias for tfsource operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for tfsource operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Validation failed for {filename}: {diagnostic}")]
    Validation { filename: String, diagnostic: String },

    #[error("Source already exists: {0}")]
    Duplicate(String),

    #[error("Source not found: {0}")]
    NotFound(String),

    #[error("{operation} timed out after {after:?}")]
    Timeout { operation: String, after: Duration },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl Error {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Short machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Io { .. } => "io",
            Error::Validation { .. } => "validation",
            Error::Duplicate(_) => "duplicate",
            Error::NotFound(_) => "not_found",
            Error::Timeout { .. } => "timeout",
            Error::InvalidPath(_) => "invalid_path",
            Error::Storage(_) => "storage",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_mentions_path() {
        let err = Error::io(
            "/data/main.tf",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/data/main.tf"), "got: {}", msg);
        assert_eq!(err.kind(), "io");
    }

    #[test]
    fn test_validation_error_carries_diagnostic() {
        let err = Error::Validation {
            filename: "main.tf".to_string(),
            diagnostic: "Unsupported block type".to_string(),
        };
        assert!(err.to_string().contains("Unsupported block type"));
    }
}
