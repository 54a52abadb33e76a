//! # ratelimit_core — Distributed Rate Limiting Core
//!
//! A rate-limiting core with two algorithms (token bucket, sliding-window
//! log) and two backends (in-process, Redis-backed shared state), plus a
//! thin HTTP admission adapter built on Axum.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────┐     ┌───────────────────────┐     ┌─────────────┐
//! │   Client    │────▶│  HTTP Admission Adapter│────▶│  Shared KV  │
//! │             │     │  (axum handlers)        │     │  (Redis)    │
//! └─────────────┘     └───────────────────────┘     └─────────────┘
//!                                  │
//!                     ┌────────────┴────────────┐
//!                     ▼                         ▼
//!              ┌─────────────┐           ┌─────────────┐
//!              │ Token Bucket│           │ Sliding Win.│
//!              │ (mem/shared)│           │ (mem/shared)│
//!              └─────────────┘           └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ratelimit_core::config::Settings;
//! use ratelimit_core::server::Server;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::from_env()?;
//! // ... build an `AppState` with the configured limiter, then:
//! // Server::new(state, settings.bind_address()).run().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`algorithms`] — in-process token bucket and sliding-window log.
//! - [`redis_backend`] — shared-state equivalents, backed by Lua scripts.
//! - [`config`] — environment-driven settings.
//! - [`error`] — error type with HTTP status mapping.
//! - [`locks`] — per-key lock registry shared by both in-process algorithms.
//! - [`limiter`] — unifies the four concrete limiters behind one `check`.
//! - [`key_extract`] — client-key derivation from request headers.
//! - [`handlers`] / [`server`] / [`middleware`] — the HTTP adapter.
//! - [`result`] — the `RateLimitResult` value every limiter returns.

pub mod algorithms;
pub mod config;
pub mod error;
pub mod handlers;
pub mod key_extract;
pub mod limiter;
pub mod locks;
pub mod middleware;
pub mod redis_backend;
pub mod result;
pub mod server;

pub use config::Settings;
pub use error::RateLimitError;
pub use limiter::RateLimiter;
pub use result::RateLimitResult;

/// Result type alias for rate-limiter operations.
pub type Result<T> = std::result::Result<T, RateLimitError>;

/// Version of the rate-limiting core library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
