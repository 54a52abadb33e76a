//! Shared-state (Redis-backed) rate limiting.
//!
//! Each limiter here executes a single Lua script per check so the
//! read-refill-write or prune-count-add sequence is atomic from Redis's
//! point of view, matching the reference implementation's
//! `RedisTokenBucketLimiter` / `RedisSlidingWindowLimiter`. `redis::Script`
//! caches the script's SHA internally and falls back from `EVALSHA` to
//! `EVAL` on a `NOSCRIPT` reply, so there's no hand-rolled cache here.

pub mod client;
pub mod sliding_window;
pub mod token_bucket;

pub use client::KvClient;
pub use sliding_window::SharedSlidingWindow;
pub use token_bucket::SharedTokenBucket;
