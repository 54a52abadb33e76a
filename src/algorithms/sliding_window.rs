//! In-process sliding window log.
//!
//! Keeps an ordered log of request timestamps per key in a `VecDeque` and
//! trims entries older than the window on each call, mirroring the Python
//! reference's `SlidingWindowLimiter` (a `deque` pruned from the front).

use std::collections::VecDeque;
use std::time::Instant;

use crate::config::SlidingWindowConfig;
use crate::locks::KeyedLockRegistry;
use crate::result::{Algorithm, Backend, RateLimitMetadata, RateLimitResult};

/// In-process sliding window log limiter, one log per key. Each key's log
/// lives behind its own `parking_lot::Mutex`, obtained via a brief lookup
/// on the shared registry, so independent keys never block each other.
pub struct InMemorySlidingWindow {
    config: SlidingWindowConfig,
    registry: KeyedLockRegistry<String, VecDeque<Instant>>,
    origin: Instant,
}

impl InMemorySlidingWindow {
    pub fn new(config: SlidingWindowConfig) -> Self {
        Self {
            config,
            registry: KeyedLockRegistry::new(),
            origin: Instant::now(),
        }
    }

    fn now_ms(&self, now: Instant) -> u64 {
        now.saturating_duration_since(self.origin).as_millis() as u64
    }

    /// Records a single request against `key` and reports admission.
    pub fn check(&self, key: &str) -> RateLimitResult {
        let now = Instant::now();
        let now_ms = self.now_ms(now);
        let window_ms = self.config.window_size_ms;
        let cutoff = now_ms.saturating_sub(window_ms);

        let cell = self
            .registry
            .get_or_insert_with(key.to_string(), VecDeque::new);
        let mut log = cell.lock();

        while matches!(log.front(), Some(&ts) if self.now_ms(ts) <= cutoff) {
            log.pop_front();
        }

        let metadata = RateLimitMetadata::new(Algorithm::SlidingWindowLog, Backend::Memory);

        if (log.len() as u64) < self.config.max_requests {
            log.push_back(now);
            let remaining = (self.config.max_requests - log.len() as u64) as f64;
            RateLimitResult::allowed(remaining, metadata)
        } else {
            let oldest_ms = self.now_ms(*log.front().expect("non-empty: len >= max_requests > 0"));
            let retry_after_ms = window_ms.saturating_sub(now_ms.saturating_sub(oldest_ms));
            RateLimitResult::denied(0.0, retry_after_ms, metadata)
        }
    }
}
