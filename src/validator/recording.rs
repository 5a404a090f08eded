//! In-memory validator for tests and dry runs

use std::sync::Mutex;
use std::time::Duration;
use crate::validator::{Validator, Verdict};
use crate::{Error, Result};

/// Accepts everything except content containing a rejection marker, and
/// keeps a log of every content it was asked to check.
///
/// An optional artificial delay makes it behave like a slow tool: when the
/// delay exceeds the caller's timeout the call fails with [`Error::Timeout`].
#[derive(Debug, Default)]
pub struct RecordingValidator {
    reject_marker: Option<String>,
    delay: Duration,
    calls: Mutex<Vec<String>>,
}

impl RecordingValidator {
    pub fn accept_all() -> Self {
        Self::default()
    }

    /// Reject any content containing `marker`
    pub fn rejecting(marker: impl Into<String>) -> Self {
        Self {
            reject_marker: Some(marker.into()),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Every content passed to `validate`, oldest first
    pub fn calls(&self) -> Vec<String> {
        self.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Validator for RecordingValidator {
    fn validate(&self, content: &str, timeout: Duration) -> Result<Verdict> {
        self.lock().push(content.to_string());

        if self.delay > timeout {
            std::thread::sleep(timeout);
            return Err(Error::Timeout {
                operation: "validation".to_string(),
                after: timeout,
            });
        }
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        match &self.reject_marker {
            Some(marker) if content.contains(marker.as_str()) => Ok(Verdict::Invalid(format!(
                "content contains rejected marker {:?}",
                marker
            ))),
            _ => Ok(Verdict::Valid),
        }
    }
}
