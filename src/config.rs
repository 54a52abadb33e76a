//! # Configuration
//!
//! Settings are loaded from environment variables under the `RL_` prefix,
//! mirroring the Python reference's `pydantic` `Settings(env_prefix="RL_")`.
//! We hand-parse `std::env::var` rather than pulling in a config-file crate:
//! there is no multi-source/layered config requirement here, just env vars
//! with defaults, and `.env` loading is handled separately by `dotenvy` in
//! `main.rs` before these are read.

use std::time::Duration;

use regex::Regex;

use crate::error::RateLimitError;
use crate::result::FailureMode;

/// In-process and shared-backend token bucket parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenBucketConfig {
    pub capacity: u64,
    pub refill_rate: f64,
}

impl TokenBucketConfig {
    pub fn new(capacity: u64, refill_rate: f64) -> Result<Self, RateLimitError> {
        if capacity == 0 {
            return Err(RateLimitError::Config(
                "token bucket capacity must be greater than zero".into(),
            ));
        }
        if refill_rate < 0.0 {
            return Err(RateLimitError::Config(
                "token bucket refill_rate must not be negative".into(),
            ));
        }
        Ok(Self {
            capacity,
            refill_rate,
        })
    }
}

/// Sliding-window-log parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlidingWindowConfig {
    pub window_size_ms: u64,
    pub max_requests: u64,
}

impl SlidingWindowConfig {
    pub fn new(window_size_ms: u64, max_requests: u64) -> Result<Self, RateLimitError> {
        if window_size_ms == 0 {
            return Err(RateLimitError::Config(
                "sliding window window_size_ms must be greater than zero".into(),
            ));
        }
        if max_requests == 0 {
            return Err(RateLimitError::Config(
                "sliding window max_requests must be greater than zero".into(),
            ));
        }
        Ok(Self {
            window_size_ms,
            max_requests,
        })
    }
}

/// Which algorithm the server admits requests with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmChoice {
    TokenBucket,
    SlidingWindowLog,
}

/// Which state store backs the chosen algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendChoice {
    Memory,
    Shared,
}

/// Connection and namespacing parameters for the shared (Redis) backend.
#[derive(Debug, Clone)]
pub struct KvBackendConfig {
    pub redis_url: String,
    pub key_prefix: String,
    pub failure_mode: FailureMode,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl KvBackendConfig {
    /// Namespaces a caller-supplied key under this backend's prefix, the
    /// same way the Python reference's `RedisConfig` + `key_prefix` does.
    pub fn storage_key(&self, key: &str) -> String {
        format!("{}:{}", self.key_prefix, key)
    }
}

fn validate_key_prefix(prefix: &str) -> Result<(), RateLimitError> {
    let re = Regex::new(r"^[A-Za-z0-9_-]+$").expect("static regex is valid");
    if !re.is_match(prefix) {
        return Err(RateLimitError::Config(format!(
            "RL_KEY_PREFIX {:?} must match [A-Za-z0-9_-]+",
            prefix
        )));
    }
    Ok(())
}

/// Top-level settings for the `ratelimitd` server binary, loaded once at
/// startup from the process environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub redis_url: String,
    pub algorithm: AlgorithmChoice,
    pub backend: BackendChoice,
    pub token_bucket: TokenBucketConfig,
    pub sliding_window: SlidingWindowConfig,
    pub key_prefix: String,
    pub failure_mode: FailureMode,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T, RateLimitError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| RateLimitError::Config(format!("{key} is not a valid value: {raw:?}"))),
        Err(_) => Ok(default),
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, RateLimitError> {
        let host = env_or("RL_HOST", "0.0.0.0");
        let port = env_parse("RL_PORT", 8080u16)?;
        let redis_url = env_or("RL_REDIS_URL", "redis://127.0.0.1:6379");

        let algorithm = match env_or("RL_ALGORITHM", "token_bucket").as_str() {
            "token_bucket" => AlgorithmChoice::TokenBucket,
            "sliding_window" | "sliding_window_log" => AlgorithmChoice::SlidingWindowLog,
            other => {
                return Err(RateLimitError::Config(format!(
                    "RL_ALGORITHM must be \"token_bucket\" or \"sliding_window\", got {other:?}"
                )))
            }
        };

        let backend = match env_or("RL_BACKEND", "memory").as_str() {
            "memory" => BackendChoice::Memory,
            "shared" => BackendChoice::Shared,
            other => {
                return Err(RateLimitError::Config(format!(
                    "RL_BACKEND must be \"memory\" or \"shared\", got {other:?}"
                )))
            }
        };

        let capacity = env_parse("RL_CAPACITY", 10u64)?;
        let refill_rate = env_parse("RL_REFILL_RATE_PER_SEC", 1.0f64)?;
        let token_bucket = TokenBucketConfig::new(capacity, refill_rate)?;

        let window_size_ms = env_parse("RL_WINDOW_SIZE_MS", 1000u64)?;
        let max_requests = env_parse("RL_MAX_REQUESTS", 10u64)?;
        let sliding_window = SlidingWindowConfig::new(window_size_ms, max_requests)?;

        let key_prefix = env_or("RL_KEY_PREFIX", "rl");
        validate_key_prefix(&key_prefix)?;

        let failure_mode = match env_or("RL_FAILURE_MODE", "fail_open").as_str() {
            "fail_open" => FailureMode::FailOpen,
            "fail_closed" => FailureMode::FailClosed,
            other => {
                return Err(RateLimitError::Config(format!(
                    "RL_FAILURE_MODE must be \"fail_open\" or \"fail_closed\", got {other:?}"
                )))
            }
        };

        let connect_timeout_ms = env_parse("RL_CONNECT_TIMEOUT_MS", 250u64)?;
        let read_timeout_ms = env_parse("RL_READ_TIMEOUT_MS", 250u64)?;

        Ok(Self {
            host,
            port,
            redis_url,
            algorithm,
            backend,
            token_bucket,
            sliding_window,
            key_prefix,
            failure_mode,
            connect_timeout: Duration::from_millis(connect_timeout_ms),
            read_timeout: Duration::from_millis(read_timeout_ms),
        })
    }

    pub fn kv_backend_config(&self) -> KvBackendConfig {
        KvBackendConfig {
            redis_url: self.redis_url.clone(),
            key_prefix: self.key_prefix.clone(),
            failure_mode: self.failure_mode,
            connect_timeout: self.connect_timeout,
            read_timeout: self.read_timeout,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_bucket_rejects_zero_capacity() {
        assert!(TokenBucketConfig::new(0, 1.0).is_err());
    }

    #[test]
    fn token_bucket_rejects_negative_refill_rate() {
        assert!(TokenBucketConfig::new(10, -1.0).is_err());
    }

    #[test]
    fn token_bucket_accepts_zero_refill_rate() {
        assert!(TokenBucketConfig::new(10, 0.0).is_ok());
    }

    #[test]
    fn sliding_window_rejects_zero_fields() {
        assert!(SlidingWindowConfig::new(0, 10).is_err());
        assert!(SlidingWindowConfig::new(1000, 0).is_err());
    }

    #[test]
    fn key_prefix_rejects_unsafe_characters() {
        assert!(validate_key_prefix("rl:prod").is_err());
        assert!(validate_key_prefix("rl-prod_1").is_ok());
    }

    #[test]
    fn storage_key_namespaces_under_prefix() {
        let cfg = KvBackendConfig {
            redis_url: "redis://localhost".into(),
            key_prefix: "rl".into(),
            failure_mode: FailureMode::FailOpen,
            connect_timeout: Duration::from_millis(250),
            read_timeout: Duration::from_millis(250),
        };
        assert_eq!(cfg.storage_key("client-1"), "rl:client-1");
    }
}
