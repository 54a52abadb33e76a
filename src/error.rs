//! # Error Types and Handling
//!
//! This module defines the error type shared by every limiter and its
//! automatic conversion to HTTP responses.
//!
//! ## Error to HTTP Status Mapping
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │  RateLimitError Variant   │  HTTP Status        │  Notes   │
//! │  ─────────────────────────┼─────────────────────┼──────────│
//! │  Config                   │  500 Internal Error │          │
//! │  Backend                  │  never reaches here  │ (*)      │
//! │  Timeout                  │  never reaches here  │ (*)      │
//! │  Internal                 │  500 Internal Error │          │
//! └────────────────────────────────────────────────────────────┘
//! ```
//! (*) `Backend` and `Timeout` are produced by the shared-backend limiters
//! and consumed by [`crate::limiter::RateLimiter`], which turns them into a
//! [`crate::result::RateLimitResult`] carrying the applicable failure mode
//! before a handler ever sees them. A handler only observes `Config` or
//! `Internal` as a bare error.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Error type for all rate-limiter operations.
#[derive(Debug, Error)]
pub enum RateLimitError {
    /// Settings or algorithm parameters are invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The shared backend rejected or could not execute a command.
    #[error("backend error: {0}")]
    Backend(#[from] redis::RedisError),

    /// The shared backend did not respond within the configured timeout.
    #[error("backend timed out")]
    Timeout,

    /// Anything else unexpected.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for RateLimitError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let status = match self {
            RateLimitError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RateLimitError::Backend(_) | RateLimitError::Timeout => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            RateLimitError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (
            status,
            Json(serde_json::json!({
                "error": "internal_error",
                "message": message,
            })),
        )
            .into_response()
    }
}

pub type Result<T> = std::result::Result<T, RateLimitError>;
