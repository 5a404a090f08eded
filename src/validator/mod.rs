//! External validation of source content
//!
//! A [`Validator`] takes file content and says whether it is acceptable.
//! A rejected file is an ordinary outcome ([`Verdict::Invalid`] with the
//! tool's diagnostic), while failing to run the tool at all is an error.
//!
//! Implementations:
//! - [`CommandValidator`]: runs an external program (`terraform validate`)
//! - [`CachedValidator`]: memoizes verdicts of another validator by content fingerprint
//! - [`RecordingValidator`]: in-memory double that records what it was asked

pub mod cache;
pub mod command;
pub mod recording;

pub use cache::CachedValidator;
pub use command::CommandValidator;
pub use recording::RecordingValidator;

use serde::{Deserialize, Serialize};
use std::time::Duration;
use crate::Result;

/// Outcome of validating a piece of content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "diagnostic", rename_all = "lowercase")]
pub enum Verdict {
    Valid,
    /// Rejected, with human-readable diagnostic text
    Invalid(String),
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid)
    }

    /// Diagnostic text for a rejection
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Verdict::Valid => None,
            Verdict::Invalid(diagnostic) => Some(diagnostic),
        }
    }
}

/// Capability to check source content before it is committed.
///
/// Calls are synchronous and may block on an external process; they must
/// return within roughly `timeout` or fail with [`crate::Error::Timeout`].
pub trait Validator: Send + Sync {
    fn validate(&self, content: &str, timeout: Duration) -> Result<Verdict>;
}
