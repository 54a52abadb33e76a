//! In-process token bucket.
//!
//! Tokens refill continuously at `refill_rate` tokens per second and are
//! recomputed lazily on each `check` call rather than on a background
//! timer, the same approach as the Python reference's `TokenBucketLimiter`.

use std::time::Instant;

use crate::config::TokenBucketConfig;
use crate::error::RateLimitError;
use crate::locks::KeyedLockRegistry;
use crate::result::{Algorithm, Backend, RateLimitMetadata, RateLimitResult};

struct BucketState {
    tokens: f64,
    ts: Instant,
}

/// In-process token bucket limiter, one bucket per key. Each key's state
/// lives behind its own `parking_lot::Mutex`, obtained via a brief lookup
/// on the shared registry, so independent keys never block each other.
pub struct InMemoryTokenBucket {
    config: TokenBucketConfig,
    registry: KeyedLockRegistry<String, BucketState>,
}

impl InMemoryTokenBucket {
    pub fn new(config: TokenBucketConfig) -> Self {
        Self {
            config,
            registry: KeyedLockRegistry::new(),
        }
    }

    /// Checks out `tokens` tokens for `key`, returning whether the request
    /// is admitted along with the remaining balance and retry hint.
    ///
    /// # Errors
    /// Returns [`RateLimitError::Config`] if `tokens` is zero.
    pub fn check(&self, key: &str, tokens: u64) -> Result<RateLimitResult, RateLimitError> {
        if tokens == 0 {
            return Err(RateLimitError::Config("tokens must be > 0".into()));
        }

        let now = Instant::now();
        let capacity = self.config.capacity as f64;
        let cell = self.registry.get_or_insert_with(key.to_string(), || BucketState {
            tokens: capacity,
            ts: now,
        });
        let mut entry = cell.lock();

        let delta = now.saturating_duration_since(entry.ts).as_secs_f64();
        let refill = delta * self.config.refill_rate;
        if refill > 0.0 {
            entry.tokens = (entry.tokens + refill).min(capacity);
            entry.ts = now;
        }

        let requested = tokens as f64;
        let allowed = entry.tokens >= requested;
        let retry_after_ms = if allowed {
            entry.tokens -= requested;
            0
        } else if self.config.refill_rate > 0.0 {
            let missing = requested - entry.tokens;
            (missing / self.config.refill_rate * 1000.0).ceil() as u64
        } else {
            0
        };

        let remaining = entry.tokens;
        let metadata = RateLimitMetadata::new(Algorithm::TokenBucket, Backend::Memory);

        Ok(if allowed {
            RateLimitResult::allowed(remaining, metadata)
        } else {
            RateLimitResult::denied(remaining, retry_after_ms, metadata)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(capacity: u64, refill_rate: f64) -> InMemoryTokenBucket {
        InMemoryTokenBucket::new(TokenBucketConfig::new(capacity, refill_rate).unwrap())
    }

    #[test]
    fn new_key_starts_with_full_capacity() {
        let b = bucket(5, 1.0);
        let r = b.check("k", 1).unwrap();
        assert!(r.allowed);
        assert_eq!(r.remaining, 4.0);
    }

    #[test]
    fn denies_once_capacity_is_exhausted() {
        let b = bucket(2, 0.0);
        assert!(b.check("k", 1).unwrap().allowed);
        assert!(b.check("k", 1).unwrap().allowed);
        let r = b.check("k", 1).unwrap();
        assert!(!r.allowed);
        assert_eq!(r.remaining, 0.0);
    }

    #[test]
    fn retry_after_is_zero_when_refill_rate_is_zero() {
        let b = bucket(1, 0.0);
        assert!(b.check("k", 1).unwrap().allowed);
        let r = b.check("k", 1).unwrap();
        assert!(!r.allowed);
        assert_eq!(r.retry_after_ms, 0);
    }

    #[test]
    fn distinct_keys_have_independent_buckets() {
        let b = bucket(1, 0.0);
        assert!(b.check("a", 1).unwrap().allowed);
        assert!(b.check("b", 1).unwrap().allowed);
    }

    #[test]
    fn zero_tokens_is_a_config_error() {
        let b = bucket(1, 0.0);
        assert!(matches!(b.check("k", 0), Err(RateLimitError::Config(_))));
    }

    #[test]
    fn concurrent_admissions_on_one_key_allow_exactly_capacity() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;
        use std::thread;

        const CAPACITY: u64 = 50;
        const CONTENDERS: usize = 1000;

        let bucket = Arc::new(bucket(CAPACITY, 0.0));
        let allowed = Arc::new(AtomicU32::new(0));

        let handles: Vec<_> = (0..CONTENDERS)
            .map(|_| {
                let bucket = bucket.clone();
                let allowed = allowed.clone();
                thread::spawn(move || {
                    if bucket.check("contended", 1).unwrap().allowed {
                        allowed.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(allowed.load(Ordering::SeqCst), CAPACITY as u32);
    }
}
