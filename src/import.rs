//! Import - filesystem to store
//!
//! An import reads one file, derives its logical filename from the base
//! directory it was imported from, and hands both to [`SourceStore::create`].
//! Store errors come back unchanged; a missing or unreadable file is
//! [`Error::Io`], a read that overruns the I/O timeout is [`Error::Timeout`].

use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::Serialize;
use crate::filter::SourceFilter;
use crate::storage::SourceStore;
use crate::{path, timeout};
use crate::{Error, Result, Source};

/// Default bound on reading a single file
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(10);

/// Creates source records from files on disk
pub struct SourceImporter<'a> {
    store: &'a SourceStore,
    io_timeout: Duration,
    patterns: Vec<String>,
    excludes: Vec<String>,
}

impl<'a> SourceImporter<'a> {
    pub fn new(store: &'a SourceStore) -> Self {
        Self {
            store,
            io_timeout: DEFAULT_IO_TIMEOUT,
            patterns: Vec::new(),
            excludes: Vec::new(),
        }
    }

    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    /// Glob patterns selecting files for [`Self::import_dir`]
    pub fn with_patterns(mut self, patterns: Vec<String>) -> Self {
        self.patterns = patterns;
        self
    }

    /// Extra gitignore-style excludes for [`Self::import_dir`]
    pub fn with_excludes(mut self, excludes: Vec<String>) -> Self {
        self.excludes = excludes;
        self
    }

    /// Import one file located at `input_path`, relative to or below `base_dir`
    pub fn import(&self, base_dir: &Path, input_path: &Path) -> Result<Source> {
        // Fail on a bad path before touching the disk
        let filename = path::normalize(base_dir, input_path)?;
        let location = path::resolve(base_dir, input_path);

        let content = timeout::read_to_string(&location, self.io_timeout)?;
        tracing::debug!(path = %location.display(), bytes = content.len(), "read source file");

        self.store.create(&filename, &content)
    }

    /// Files under `base_dir` that [`Self::import_dir`] would import
    pub fn candidates(&self, base_dir: &Path) -> Result<Vec<PathBuf>> {
        if !base_dir.is_dir() {
            return Err(Error::io(
                base_dir,
                std::io::Error::new(std::io::ErrorKind::NotFound, "import directory does not exist"),
            ));
        }
        let filter = SourceFilter::new(base_dir, &self.patterns, &self.excludes);
        Ok(filter.walk(base_dir))
    }

    /// Import every source file under `base_dir`.
    ///
    /// A failing file does not stop the batch; its outcome lands in the report.
    pub fn import_dir(&self, base_dir: &Path) -> Result<ImportReport> {
        let files = self.candidates(base_dir)?;
        Ok(self.import_all(base_dir, &files, |_, _| {}))
    }

    /// Import each of `paths`, calling `on_each` after every file
    pub fn import_all<P, F>(&self, base_dir: &Path, paths: &[P], mut on_each: F) -> ImportReport
    where
        P: AsRef<Path>,
        F: FnMut(&Path, &Result<Source>),
    {
        let mut report = ImportReport::default();
        for input in paths {
            let input = input.as_ref();
            let result = self.import(base_dir, input);
            on_each(input, &result);
            report.record(input, result);
        }

        tracing::info!(
            imported = report.imported.len(),
            duplicates = report.duplicates.len(),
            failed = report.failed.len(),
            "import finished"
        );
        report
    }
}

/// Outcome of a batch import
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    /// Logical filenames of newly committed sources
    pub imported: Vec<String>,
    /// Logical filenames that already existed in the store
    pub duplicates: Vec<String>,
    pub failed: Vec<ImportFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportFailure {
    pub path: PathBuf,
    pub kind: &'static str,
    pub error: String,
}

impl ImportReport {
    fn record(&mut self, input: &Path, result: Result<Source>) {
        match result {
            Ok(source) => self.imported.push(source.filename),
            Err(Error::Duplicate(filename)) => self.duplicates.push(filename),
            Err(e) => self.failed.push(ImportFailure {
                path: input.to_path_buf(),
                kind: e.kind(),
                error: e.to_string(),
            }),
        }
    }

    /// True when nothing failed (duplicates are not failures)
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}
