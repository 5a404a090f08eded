//! Verdict cache keyed by content fingerprint

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use crate::source::fingerprint;
use crate::validator::{Validator, Verdict};
use crate::Result;

/// Wraps a validator and remembers its verdicts per BLAKE3 content hash.
///
/// Only definitive verdicts are cached. Errors and timeouts go straight back
/// to the caller and the next call for the same content runs the tool again.
pub struct CachedValidator<V> {
    inner: V,
    verdicts: Mutex<HashMap<String, Verdict>>,
}

impl<V: Validator> CachedValidator<V> {
    pub fn new(inner: V) -> Self {
        Self {
            inner,
            verdicts: Mutex::new(HashMap::new()),
        }
    }

    /// Number of cached verdicts
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn inner(&self) -> &V {
        &self.inner
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Verdict>> {
        self.verdicts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<V: Validator> Validator for CachedValidator<V> {
    fn validate(&self, content: &str, timeout: Duration) -> Result<Verdict> {
        let key = fingerprint(content);
        if let Some(verdict) = self.lock().get(&key) {
            tracing::debug!(fingerprint = %key, "validation cache hit");
            return Ok(verdict.clone());
        }

        // Not holding the lock while the tool runs
        let verdict = self.inner.validate(content, timeout)?;
        self.lock().insert(key, verdict.clone());
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::RecordingValidator;
    use crate::Error;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn test_identical_content_validated_once() {
        let cached = CachedValidator::new(RecordingValidator::accept_all());

        assert!(cached.validate("resource X {}", TIMEOUT).unwrap().is_valid());
        assert!(cached.validate("resource X {}", TIMEOUT).unwrap().is_valid());
        assert!(cached.validate("resource Y {}", TIMEOUT).unwrap().is_valid());

        assert_eq!(cached.inner().call_count(), 2);
        assert_eq!(cached.len(), 2);
    }

    #[test]
    fn test_rejections_are_cached_too() {
        let cached = CachedValidator::new(RecordingValidator::rejecting("INVALID"));

        let first = cached.validate("INVALID block", TIMEOUT).unwrap();
        let second = cached.validate("INVALID block", TIMEOUT).unwrap();

        assert_eq!(first, second);
        assert!(!first.is_valid());
        assert_eq!(cached.inner().call_count(), 1);
    }

    #[test]
    fn test_timeouts_are_not_cached() {
        let cached = CachedValidator::new(
            RecordingValidator::accept_all().with_delay(Duration::from_millis(100)),
        );

        let err = cached.validate("slow", Duration::from_millis(10)).unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
        assert!(cached.is_empty());

        assert!(cached.validate("slow", TIMEOUT).unwrap().is_valid());
        assert_eq!(cached.len(), 1);
    }
}
