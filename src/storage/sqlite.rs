//! SQLite storage implementation

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use crate::source::{Source, SourceDraft};
use crate::validator::{Validator, Verdict};
use crate::{Error, Result};
use super::schema;

/// Default bound on a single validator run
pub const DEFAULT_VALIDATION_TIMEOUT: Duration = Duration::from_secs(60);

/// How long a connection waits for another writer's lock
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SOURCE_COLUMNS: &str = "id, filename, content, created_at, updated_at";

/// SQLite-backed store of validated sources.
///
/// Every write runs the validator first; nothing reaches the table unless
/// the validator accepted it.
pub struct SourceStore {
    conn: Connection,
    validator: Arc<dyn Validator>,
    validation_timeout: Duration,
}

impl SourceStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path, validator: Arc<dyn Validator>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn, validator)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory(validator: Arc<dyn Validator>) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, validator)
    }

    fn with_connection(conn: Connection, validator: Arc<dyn Validator>) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let store = Self {
            conn,
            validator,
            validation_timeout: DEFAULT_VALIDATION_TIMEOUT,
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Bound every validator run made by this store
    pub fn with_validation_timeout(mut self, timeout: Duration) -> Self {
        self.validation_timeout = timeout;
        self
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    // ========== Write Operations ==========

    /// Validate and persist a new source
    pub fn create(&self, filename: &str, content: &str) -> Result<Source> {
        let draft = SourceDraft::new(filename, content)?;
        self.commit(draft)
    }

    /// Move a draft to the committed state: uniqueness pre-check, validation, insert.
    ///
    /// The pre-check only spares a validator run; the `UNIQUE` constraint on
    /// the insert is what decides between concurrent creators.
    pub fn commit(&self, draft: SourceDraft) -> Result<Source> {
        if self.exists(draft.filename())? {
            return Err(Error::Duplicate(draft.filename().to_string()));
        }

        self.check(draft.filename(), draft.content())?;

        let now = Utc::now();
        let inserted = self.conn.execute(
            r#"
            INSERT INTO sources (filename, content, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?3)
            "#,
            params![draft.filename(), draft.content(), now],
        );

        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                tracing::warn!(filename = draft.filename(), "lost create race");
                return Err(Error::Duplicate(draft.filename().to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        let id = self.conn.last_insert_rowid();
        tracing::info!(id, filename = draft.filename(), "source committed");
        self.get(id)
    }

    /// Replace the content of an existing source after validating it.
    ///
    /// The filename never changes. Concurrent updates of one record: the last
    /// writer wins.
    pub fn update(&self, id: i64, content: &str) -> Result<Source> {
        let existing = self.get(id)?;
        self.check(&existing.filename, content)?;

        let changed = self.conn.execute(
            "UPDATE sources SET content = ?1, updated_at = ?2 WHERE id = ?3",
            params![content, Utc::now(), id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("id {}", id)));
        }

        tracing::info!(id, filename = %existing.filename, "source updated");
        self.get(id)
    }

    /// Delete a source by id
    pub fn delete(&self, id: i64) -> Result<()> {
        let changed = self.conn.execute("DELETE FROM sources WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(Error::NotFound(format!("id {}", id)));
        }
        tracing::info!(id, "source deleted");
        Ok(())
    }

    fn check(&self, filename: &str, content: &str) -> Result<()> {
        match self.validator.validate(content, self.validation_timeout)? {
            Verdict::Valid => Ok(()),
            Verdict::Invalid(diagnostic) => {
                tracing::warn!(filename, %diagnostic, "validation rejected source");
                Err(Error::Validation {
                    filename: filename.to_string(),
                    diagnostic,
                })
            }
        }
    }

    // ========== Read Operations ==========

    /// Find a source by logical filename
    pub fn find(&self, filename: &str) -> Result<Source> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM sources WHERE filename = ?1", SOURCE_COLUMNS),
                [filename],
                row_to_source,
            )
            .optional()?
            .ok_or_else(|| Error::NotFound(filename.to_string()))
    }

    /// Get a source by id
    pub fn get(&self, id: i64) -> Result<Source> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM sources WHERE id = ?1", SOURCE_COLUMNS),
                [id],
                row_to_source,
            )
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("id {}", id)))
    }

    /// Whether a source with this filename exists
    pub fn exists(&self, filename: &str) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT id FROM sources WHERE filename = ?1", [filename], |row| row.get(0))
            .optional()?;
        Ok(found.is_some())
    }

    /// All sources ordered by filename
    pub fn list(&self) -> Result<Vec<Source>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM sources ORDER BY filename",
            SOURCE_COLUMNS
        ))?;

        let sources = stmt
            .query_map([], row_to_source)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(sources)
    }

    /// Count all sources
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM sources", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<StoreStats> {
        let (total_bytes, last_updated): (Option<i64>, Option<DateTime<Utc>>) = self.conn.query_row(
            "SELECT SUM(length(CAST(content AS BLOB))), MAX(updated_at) FROM sources",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(StoreStats {
            sources: self.count()?,
            total_bytes: total_bytes.unwrap_or(0) as u64,
            last_updated,
        })
    }
}

/// Helper to convert a row to a Source
fn row_to_source(row: &rusqlite::Row) -> rusqlite::Result<Source> {
    Ok(Source {
        id: row.get(0)?,
        filename: row.get(1)?,
        content: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Database statistics
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub sources: usize,
    pub total_bytes: u64,
    pub last_updated: Option<DateTime<Utc>>,
}
