//! Deadline-bounded filesystem I/O
//!
//! `std::fs` has no timeouts, so each bounded call runs on a short-lived
//! worker thread and the caller waits on a channel with a deadline. When the
//! deadline passes the caller gets [`Error::Timeout`]; the worker is left to
//! finish on its own and its result is discarded.

use std::path::{Path, PathBuf};
use std::time::Duration;
use crossbeam::channel::{self, RecvTimeoutError};
use crate::{Error, Result};

/// Read a UTF-8 file, giving up after `timeout`
pub fn read_to_string(path: &Path, timeout: Duration) -> Result<String> {
    let owned = path.to_path_buf();
    bounded(path, "read", timeout, move || {
        std::fs::read_to_string(&owned).map_err(|e| Error::io(&owned, e))
    })
}

/// Write `content` to `path`, creating parent directories, giving up after `timeout`
pub fn write(path: &Path, content: &str, timeout: Duration) -> Result<()> {
    let owned = path.to_path_buf();
    let content = content.to_string();
    bounded(path, "write", timeout, move || {
        if let Some(parent) = owned.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
            }
        }
        std::fs::write(&owned, content).map_err(|e| Error::io(&owned, e))
    })
}

fn bounded<T, F>(path: &Path, verb: &str, timeout: Duration, op: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let (tx, rx) = channel::bounded(1);

    std::thread::Builder::new()
        .name(format!("tfsource-{}", verb))
        .spawn(move || {
            // The receiver may already have given up
            let _ = tx.send(op());
        })
        .map_err(|e| Error::io(path, e))?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => {
            tracing::warn!(path = %path.display(), ?timeout, "{} timed out", verb);
            Err(Error::Timeout {
                operation: format!("{} {}", verb, path.display()),
                after: timeout,
            })
        }
        Err(RecvTimeoutError::Disconnected) => Err(Error::io(
            PathBuf::from(path),
            std::io::Error::other(format!("{} worker exited without a result", verb)),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("main.tf");

        write(&path, "resource X {}", Duration::from_secs(5)).unwrap();
        let content = read_to_string(&path, Duration::from_secs(5)).unwrap();
        assert_eq!(content, "resource X {}");
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.tf");

        let err = read_to_string(&path, Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, Error::Io { .. }), "got {:?}", err);
    }

    #[test]
    fn test_slow_operation_times_out() {
        let result: Result<()> = bounded(Path::new("slow"), "read", Duration::from_millis(50), || {
            std::thread::sleep(Duration::from_millis(500));
            Ok(())
        });
        match result {
            Err(Error::Timeout { after, .. }) => assert_eq!(after, Duration::from_millis(50)),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[test]
    fn test_panicking_worker_is_io_error() {
        let result: Result<()> = bounded(Path::new("boom"), "read", Duration::from_secs(5), || {
            panic!("worker failure")
        });
        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
