//! Export - store to filesystem
//!
//! Writes `target_dir/<logical filename>`, creating any intermediate
//! directories. Exporting the same source twice leaves the same bytes on
//! disk. The source record itself is only read.

use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::{path, timeout};
use crate::{Error, Result, Source};

/// Default bound on writing a single file
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(10);

/// Writes sources back to disk
#[derive(Debug, Clone)]
pub struct SourceExporter {
    default_dir: PathBuf,
    io_timeout: Duration,
}

impl SourceExporter {
    /// `default_dir` is where [`Self::export`] writes
    pub fn new(default_dir: impl Into<PathBuf>) -> Self {
        Self {
            default_dir: default_dir.into(),
            io_timeout: DEFAULT_IO_TIMEOUT,
        }
    }

    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    pub fn default_dir(&self) -> &Path {
        &self.default_dir
    }

    /// Export into the configured default directory
    pub fn export(&self, source: &Source) -> Result<PathBuf> {
        self.export_into(source, &self.default_dir)
    }

    /// Export into `target_dir`, returning the written path
    pub fn export_into(&self, source: &Source, target_dir: &Path) -> Result<PathBuf> {
        let target = target_path(target_dir, &source.filename)?;
        timeout::write(&target, &source.content, self.io_timeout)?;
        tracing::info!(filename = %source.filename, path = %target.display(), "source exported");
        Ok(target)
    }

    /// Export several sources into `target_dir`, stopping at the first failure
    pub fn export_all<'s, I>(&self, sources: I, target_dir: &Path) -> Result<Vec<PathBuf>>
    where
        I: IntoIterator<Item = &'s Source>,
    {
        sources
            .into_iter()
            .map(|source| self.export_into(source, target_dir))
            .collect()
    }
}

fn target_path(target_dir: &Path, filename: &str) -> Result<PathBuf> {
    if !path::is_safe_relative(filename) {
        return Err(Error::InvalidPath(format!(
            "{} cannot be exported below {}",
            filename,
            target_dir.display()
        )));
    }
    Ok(filename
        .split(path::SEPARATOR)
        .fold(target_dir.to_path_buf(), |acc, segment| acc.join(segment)))
}
