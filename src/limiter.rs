//! Unifying entry point used by the HTTP adapter: one `check` call
//! regardless of which algorithm/backend combination the server was
//! started with.

use std::sync::Arc;

use crate::algorithms::{InMemorySlidingWindow, InMemoryTokenBucket};
use crate::error::RateLimitError;
use crate::redis_backend::{SharedSlidingWindow, SharedTokenBucket};
use crate::result::RateLimitResult;

/// One of the four concrete limiters, selected at startup from
/// [`crate::config::Settings`].
pub enum RateLimiter {
    InMemoryTokenBucket(InMemoryTokenBucket),
    InMemorySlidingWindow(InMemorySlidingWindow),
    SharedTokenBucket(SharedTokenBucket),
    SharedSlidingWindow(SharedSlidingWindow),
}

impl RateLimiter {
    /// # Errors
    /// Returns [`RateLimitError::Config`] if `tokens` is zero. The sliding
    /// window variants have no native multi-token request, so this is
    /// checked here rather than per-call-into-the-log, to avoid consuming
    /// a slot for a zero-token request.
    pub async fn check(&self, key: &str, tokens: u64) -> Result<RateLimitResult, RateLimitError> {
        if tokens == 0 {
            return Err(RateLimitError::Config("tokens must be > 0".into()));
        }

        match self {
            RateLimiter::InMemoryTokenBucket(l) => l.check(key, tokens),
            RateLimiter::InMemorySlidingWindow(l) => {
                let mut result = l.check(key);
                for _ in 1..tokens {
                    result = l.check(key);
                }
                Ok(result)
            }
            RateLimiter::SharedTokenBucket(l) => l.check(key, tokens).await,
            RateLimiter::SharedSlidingWindow(l) => {
                let mut result = l.check(key).await;
                for _ in 1..tokens {
                    result = l.check(key).await;
                }
                Ok(result)
            }
        }
    }
}

pub type SharedRateLimiter = Arc<RateLimiter>;
