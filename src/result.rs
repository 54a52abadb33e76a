//! # Rate Limit Result
//!
//! The single value every limiter — in-process or Redis-backed, token
//! bucket or sliding window — returns from a `check` call. Everything
//! about the decision, including degraded-mode information, lives in this
//! one immutable value rather than being split across a `Result` error
//! channel and a success payload.

use serde::Serialize;

/// Which algorithm produced a [`RateLimitResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    TokenBucket,
    SlidingWindowLog,
}

/// Which backend produced a [`RateLimitResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    Memory,
    Shared,
}

/// Degraded-mode policy applied when the shared backend is unreachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    FailOpen,
    FailClosed,
}

/// Metadata identifying how a [`RateLimitResult`] was produced.
#[derive(Debug, Clone, Serialize)]
pub struct RateLimitMetadata {
    pub algorithm: Algorithm,
    pub backend: Backend,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<FailureMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RateLimitMetadata {
    pub fn new(algorithm: Algorithm, backend: Backend) -> Self {
        Self {
            algorithm,
            backend,
            mode: None,
            error: None,
        }
    }

    pub fn with_mode(mut self, mode: FailureMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// The outcome of a single admission decision.
///
/// Immutable once constructed: every field is set exactly once, through one
/// of the constructor functions below, and never mutated afterward.
#[derive(Debug, Clone, Serialize)]
pub struct RateLimitResult {
    pub allowed: bool,
    /// Fractional tokens or slots left. `f64::INFINITY` when a shared
    /// limiter has failed open.
    pub remaining: f64,
    pub retry_after_ms: u64,
    pub metadata: RateLimitMetadata,
}

impl RateLimitResult {
    pub fn allowed(remaining: f64, metadata: RateLimitMetadata) -> Self {
        Self {
            allowed: true,
            remaining,
            retry_after_ms: 0,
            metadata,
        }
    }

    pub fn denied(remaining: f64, retry_after_ms: u64, metadata: RateLimitMetadata) -> Self {
        Self {
            allowed: false,
            remaining,
            retry_after_ms,
            metadata,
        }
    }

    /// Constructs the sentinel result for a shared limiter that failed open:
    /// the request is admitted and `remaining` is reported as unbounded.
    pub fn fail_open(algorithm: Algorithm, error: impl Into<String>) -> Self {
        Self {
            allowed: true,
            remaining: f64::INFINITY,
            retry_after_ms: 0,
            metadata: RateLimitMetadata::new(algorithm, Backend::Shared)
                .with_mode(FailureMode::FailOpen)
                .with_error(error),
        }
    }

    /// Constructs the sentinel result for a shared limiter that failed
    /// closed: the request is rejected outright.
    pub fn fail_closed(algorithm: Algorithm, error: impl Into<String>) -> Self {
        Self {
            allowed: false,
            remaining: 0.0,
            retry_after_ms: 0,
            metadata: RateLimitMetadata::new(algorithm, Backend::Shared)
                .with_mode(FailureMode::FailClosed)
                .with_error(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fail_open_reports_infinite_remaining() {
        let r = RateLimitResult::fail_open(Algorithm::TokenBucket, "connection refused");
        assert!(r.allowed);
        assert!(r.remaining.is_infinite());
        assert_eq!(r.retry_after_ms, 0);
        assert_eq!(r.metadata.mode, Some(FailureMode::FailOpen));
    }

    #[test]
    fn fail_closed_denies_with_zero_remaining() {
        let r = RateLimitResult::fail_closed(Algorithm::SlidingWindowLog, "timeout");
        assert!(!r.allowed);
        assert_eq!(r.remaining, 0.0);
        assert_eq!(r.metadata.mode, Some(FailureMode::FailClosed));
    }
}
