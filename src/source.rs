//! Source records - the persisted form of one infrastructure-definition file
//!
//! A record moves through two states:
//! - [`SourceDraft`]: proposed filename and content, not yet validated
//! - [`Source`]: validated and committed by the store
//!
//! There is no persisted "invalid" state; a draft that fails validation is
//! dropped and the caller gets the error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::path;
use crate::{Error, Result};

/// A committed source record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Row id assigned by the store
    pub id: i64,
    /// Logical filename, unique across all records
    pub filename: String,
    /// Raw file content
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Source {
    /// Size of the content in bytes
    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// BLAKE3 fingerprint of the content
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.content)
    }
}

/// A proposed source that has not passed validation yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDraft {
    filename: String,
    content: String,
}

impl SourceDraft {
    /// Create a draft, checking that the filename is usable as an export path
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Result<Self> {
        let filename = filename.into();
        if filename.is_empty() {
            return Err(Error::InvalidPath("filename must not be empty".to_string()));
        }
        if !path::is_safe_relative(&filename) {
            return Err(Error::InvalidPath(format!(
                "{} is not a clean relative path",
                filename
            )));
        }
        Ok(Self {
            filename,
            content: content.into(),
        })
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// BLAKE3 hex digest of a content string
pub fn fingerprint(content: &str) -> String {
    blake3::hash(content.as_bytes()).to_string()
}
