//! Shared-state sliding window log, backed by a single atomic Lua script.
//!
//! Each admitted request is recorded as a uniquely-named member of a Redis
//! sorted set scored by its timestamp. Lua 5.1 as embedded in Redis has no
//! exposed source of randomness, so the unique member name
//! (`"<now_ms>-<uuid v4>"`) is generated on the Rust side before the script
//! runs, rather than inside the script.

use redis::Script;
use tracing::warn;
use uuid::Uuid;

use crate::config::{KvBackendConfig, SlidingWindowConfig};
use crate::redis_backend::client::KvClient;
use crate::result::{Algorithm, Backend, FailureMode, RateLimitMetadata, RateLimitResult};

const SCRIPT_SOURCE: &str = include_str!("sliding_window.lua");

pub struct SharedSlidingWindow {
    client: KvClient,
    kv_config: KvBackendConfig,
    window_config: SlidingWindowConfig,
    script: Script,
}

impl SharedSlidingWindow {
    pub fn new(
        client: KvClient,
        kv_config: KvBackendConfig,
        window_config: SlidingWindowConfig,
    ) -> Self {
        Self {
            client,
            kv_config,
            window_config,
            script: Script::new(SCRIPT_SOURCE),
        }
    }

    pub async fn check(&self, key: &str) -> RateLimitResult {
        let storage_key = self.kv_config.storage_key(key);
        let now_ms = current_millis();
        let member = format!("{now_ms}-{}", Uuid::new_v4());

        let mut conn = self.client.connection();
        let invocation = self
            .script
            .key(&storage_key)
            .arg(now_ms)
            .arg(self.window_config.window_size_ms)
            .arg(self.window_config.max_requests)
            .arg(member)
            .invoke_async::<_, (i64, i64, i64)>(&mut conn);

        let outcome = tokio::time::timeout(self.kv_config.read_timeout, invocation).await;

        match outcome {
            Ok(Ok((allowed, remaining, retry_after_ms))) => {
                let metadata = RateLimitMetadata::new(Algorithm::SlidingWindowLog, Backend::Shared);
                if allowed == 1 {
                    RateLimitResult::allowed(remaining.max(0) as f64, metadata)
                } else {
                    RateLimitResult::denied(0.0, retry_after_ms.max(0) as u64, metadata)
                }
            }
            Ok(Err(err)) => self.on_failure(err.to_string()),
            Err(_elapsed) => self.on_failure("read timed out".to_string()),
        }
    }

    fn on_failure(&self, error: String) -> RateLimitResult {
        match self.kv_config.failure_mode {
            FailureMode::FailOpen => {
                warn!(%error, "shared backend unavailable, failing open");
                RateLimitResult::fail_open(Algorithm::SlidingWindowLog, error)
            }
            FailureMode::FailClosed => {
                warn!(%error, "shared backend unavailable, failing closed");
                RateLimitResult::fail_closed(Algorithm::SlidingWindowLog, error)
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
