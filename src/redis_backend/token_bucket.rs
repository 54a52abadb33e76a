//! Shared-state token bucket, backed by a single atomic Lua script.

use redis::Script;
use tracing::warn;

use crate::config::{KvBackendConfig, TokenBucketConfig};
use crate::error::RateLimitError;
use crate::redis_backend::client::KvClient;
use crate::result::{Algorithm, Backend, FailureMode, RateLimitMetadata, RateLimitResult};

const SCRIPT_SOURCE: &str = include_str!("token_bucket.lua");

pub struct SharedTokenBucket {
    client: KvClient,
    kv_config: KvBackendConfig,
    bucket_config: TokenBucketConfig,
    script: Script,
}

impl SharedTokenBucket {
    pub fn new(client: KvClient, kv_config: KvBackendConfig, bucket_config: TokenBucketConfig) -> Self {
        Self {
            client,
            kv_config,
            bucket_config,
            script: Script::new(SCRIPT_SOURCE),
        }
    }

    /// # Errors
    /// Returns [`RateLimitError::Config`] if `tokens` is zero. Backend
    /// unavailability does not surface as an `Err` here — it's reported as
    /// an `Ok(RateLimitResult)` carrying the configured failure mode.
    pub async fn check(&self, key: &str, tokens: u64) -> Result<RateLimitResult, RateLimitError> {
        if tokens == 0 {
            return Err(RateLimitError::Config("tokens must be > 0".into()));
        }

        let storage_key = self.kv_config.storage_key(key);
        let now_ms = current_millis();
        let refill_rate_per_ms = self.bucket_config.refill_rate / 1000.0;

        let mut conn = self.client.connection();
        let invocation = self
            .script
            .key(&storage_key)
            .arg(now_ms)
            .arg(self.bucket_config.capacity)
            .arg(refill_rate_per_ms)
            .arg(tokens)
            .invoke_async::<_, (i64, String, i64)>(&mut conn);

        let outcome = tokio::time::timeout(self.kv_config.read_timeout, invocation).await;

        let result = match outcome {
            Ok(Ok((allowed, tokens_left_raw, retry_after_ms))) => {
                let tokens_left: f64 = tokens_left_raw.parse().unwrap_or(0.0);
                let metadata = RateLimitMetadata::new(Algorithm::TokenBucket, Backend::Shared);
                if allowed == 1 {
                    RateLimitResult::allowed(tokens_left, metadata)
                } else {
                    RateLimitResult::denied(tokens_left, retry_after_ms.max(0) as u64, metadata)
                }
            }
            Ok(Err(err)) => self.on_failure(err.to_string()),
            Err(_elapsed) => self.on_failure("read timed out".to_string()),
        };

        Ok(result)
    }

    fn on_failure(&self, error: String) -> RateLimitResult {
        match self.kv_config.failure_mode {
            FailureMode::FailOpen => {
                warn!(%error, "shared backend unavailable, failing open");
                RateLimitResult::fail_open(Algorithm::TokenBucket, error)
            }
            FailureMode::FailClosed => {
                warn!(%error, "shared backend unavailable, failing closed");
                RateLimitResult::fail_closed(Algorithm::TokenBucket, error)
            }
        }
    }
}

fn current_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
