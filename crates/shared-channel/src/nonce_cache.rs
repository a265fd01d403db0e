//! # Time-Bounded Nonce Cache
//!
//! Guarantees a mailbox hands any envelope to its owner at most once.
//!
//! - Envelopes are only accepted within their timestamp window (60s past, 10s future)
//! - Nonces are garbage-collected once they fall out of the validity window
//! - Memory therefore stays bounded by the traffic of one window

use shared_types::Envelope;
use shared_types::ProtocolMessage;
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

/// Errors from nonce cache operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NonceError {
    /// The nonce was already accepted once.
    #[error("Nonce {nonce} has already been used (duplicate delivery)")]
    NonceReused { nonce: Uuid },

    /// The envelope timestamp is too old.
    #[error("Message timestamp {timestamp} is too old (threshold: {threshold})")]
    MessageTooOld { timestamp: u64, threshold: u64 },

    /// The envelope timestamp is in the future.
    #[error("Message timestamp {timestamp} is in the future (threshold: {threshold})")]
    MessageFromFuture { timestamp: u64, threshold: u64 },
}

/// Time-bounded cache of accepted nonces.
pub struct TimeBoundedNonceCache {
    /// nonce -> envelope timestamp.
    cache: HashMap<Uuid, u64>,
    validity_window_secs: u64,
    last_gc: u64,
    gc_interval_secs: u64,
}

impl TimeBoundedNonceCache {
    /// Default validity window: twice the envelope age limit.
    pub const DEFAULT_VALIDITY_WINDOW: u64 = 2 * Envelope::<ProtocolMessage>::MAX_AGE;

    /// Default garbage collection interval.
    pub const DEFAULT_GC_INTERVAL: u64 = 10;

    /// Create a nonce cache with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Self::DEFAULT_VALIDITY_WINDOW, Self::DEFAULT_GC_INTERVAL)
    }

    /// Create a nonce cache with custom settings.
    #[must_use]
    pub fn with_config(validity_window_secs: u64, gc_interval_secs: u64) -> Self {
        Self {
            cache: HashMap::new(),
            validity_window_secs,
            last_gc: shared_types::envelope::unix_now(),
            gc_interval_secs,
        }
    }

    /// Validate the timestamp, then check and record the nonce.
    ///
    /// The timestamp check runs first so that every later step is bounded.
    pub fn validate_and_add(&mut self, nonce: Uuid, timestamp: u64) -> Result<(), NonceError> {
        self.validate_and_add_at(nonce, timestamp, shared_types::envelope::unix_now())
    }

    fn validate_and_add_at(
        &mut self,
        nonce: Uuid,
        timestamp: u64,
        now: u64,
    ) -> Result<(), NonceError> {
        let min_valid = now.saturating_sub(Envelope::<ProtocolMessage>::MAX_AGE);
        let max_valid = now.saturating_add(Envelope::<ProtocolMessage>::MAX_FUTURE_SKEW);

        if timestamp < min_valid {
            return Err(NonceError::MessageTooOld {
                timestamp,
                threshold: min_valid,
            });
        }
        if timestamp > max_valid {
            return Err(NonceError::MessageFromFuture {
                timestamp,
                threshold: max_valid,
            });
        }

        if now.saturating_sub(self.last_gc) > self.gc_interval_secs {
            self.garbage_collect(now);
            self.last_gc = now;
        }

        if self.cache.contains_key(&nonce) {
            return Err(NonceError::NonceReused { nonce });
        }
        self.cache.insert(nonce, timestamp);
        Ok(())
    }

    /// Check if a nonce exists without adding it.
    #[must_use]
    pub fn contains(&self, nonce: &Uuid) -> bool {
        self.cache.contains_key(nonce)
    }

    /// Number of cached nonces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    fn garbage_collect(&mut self, now: u64) {
        let expiry_threshold = now.saturating_sub(self.validity_window_secs);
        self.cache.retain(|_, &mut ts| ts > expiry_threshold);
    }
}

impl Default for TimeBoundedNonceCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 1_700_000_000;

    #[test]
    fn test_fresh_nonce_accepted() {
        let mut cache = TimeBoundedNonceCache::new();
        let nonce = Uuid::new_v4();

        assert!(cache.validate_and_add_at(nonce, NOW, NOW).is_ok());
        assert!(cache.contains(&nonce));
    }

    #[test]
    fn test_duplicate_nonce_rejected() {
        let mut cache = TimeBoundedNonceCache::new();
        let nonce = Uuid::new_v4();

        cache.validate_and_add_at(nonce, NOW, NOW).unwrap();
        let result = cache.validate_and_add_at(nonce, NOW, NOW);
        assert!(matches!(result, Err(NonceError::NonceReused { .. })));
    }

    #[test]
    fn test_timestamp_window() {
        let mut cache = TimeBoundedNonceCache::new();

        let too_old = cache.validate_and_add_at(Uuid::new_v4(), NOW - 120, NOW);
        assert!(matches!(too_old, Err(NonceError::MessageTooOld { .. })));

        let future = cache.validate_and_add_at(Uuid::new_v4(), NOW + 60, NOW);
        assert!(matches!(future, Err(NonceError::MessageFromFuture { .. })));

        assert!(cache.validate_and_add_at(Uuid::new_v4(), NOW + 5, NOW).is_ok());
        assert!(cache.validate_and_add_at(Uuid::new_v4(), NOW - 30, NOW).is_ok());
    }

    #[test]
    fn test_garbage_collection_drops_expired() {
        let mut cache = TimeBoundedNonceCache::with_config(60, 5);
        cache.last_gc = NOW;
        cache.validate_and_add_at(Uuid::new_v4(), NOW, NOW).unwrap();
        assert_eq!(cache.len(), 1);

        // 61s later the first nonce is outside the 60s validity window.
        let later = NOW + 61;
        cache.validate_and_add_at(Uuid::new_v4(), later, later).unwrap();
        assert_eq!(cache.len(), 1);
    }
}
