//! In-process rate limiting algorithms.
//!
//! Both implementations here keep per-key state behind a
//! [`crate::locks::KeyedLockRegistry`] and hold a lock only for the
//! duration of the read-modify-write on that one key's state.

pub mod sliding_window;
pub mod token_bucket;

pub use sliding_window::InMemorySlidingWindow;
pub use token_bucket::InMemoryTokenBucket;
