//! # Per-Key State Registry
//!
//! Keeps a map of key to `Arc<Mutex<V>>` so that distinct keys never block
//! each other: the registry's own guard mutex is held only long enough to
//! look up or insert a key's entry, and the per-key mutex then guards that
//! key's state for the rest of the operation. For simplicity it doesn't
//! garbage collect old entries, same as the reference implementation this
//! is ported from.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;

/// Hands out a per-key `Arc<Mutex<V>>`, creating one with the caller's
/// default on first use.
pub struct KeyedLockRegistry<K, V> {
    entries: Mutex<HashMap<K, Arc<Mutex<V>>>>,
}

impl<K, V> Default for KeyedLockRegistry<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> KeyedLockRegistry<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the `Arc<Mutex<V>>` for `key`, inserting `default()`'s
    /// result if this is the first time `key` has been seen. Callers lock
    /// the returned `Arc` themselves around their critical section; the
    /// registry's own lock is released before that happens.
    pub fn get_or_insert_with(&self, key: K, default: impl FnOnce() -> V) -> Arc<Mutex<V>> {
        let mut entries = self.entries.lock();
        entries.entry(key).or_insert_with(|| Arc::new(Mutex::new(default()))).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn returns_the_same_cell_for_the_same_key() {
        let registry: KeyedLockRegistry<String, u32> = KeyedLockRegistry::new();
        let a = registry.get_or_insert_with("client-1".to_string(), || 0);
        let b = registry.get_or_insert_with("client-1".to_string(), || 0);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn returns_distinct_cells_for_distinct_keys() {
        let registry: KeyedLockRegistry<String, u32> = KeyedLockRegistry::new();
        let a = registry.get_or_insert_with("client-1".to_string(), || 0);
        let b = registry.get_or_insert_with("client-2".to_string(), || 0);
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn default_is_only_used_on_first_insert() {
        let registry: KeyedLockRegistry<String, u32> = KeyedLockRegistry::new();
        let cell = registry.get_or_insert_with("k".to_string(), || 1);
        *cell.lock() = 42;
        let same_cell = registry.get_or_insert_with("k".to_string(), || 999);
        assert_eq!(*same_cell.lock(), 42);
    }

    #[test]
    fn serializes_concurrent_access_per_key() {
        let registry: Arc<KeyedLockRegistry<String, u32>> = Arc::new(KeyedLockRegistry::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                thread::spawn(move || {
                    let cell = registry.get_or_insert_with("shared".to_string(), || 0);
                    let mut counter = cell.lock();
                    *counter += 1;
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        let cell = registry.get_or_insert_with("shared".to_string(), || 0);
        assert_eq!(*cell.lock(), 8);
    }

    #[test]
    fn distinct_keys_can_be_locked_concurrently() {
        let registry: Arc<KeyedLockRegistry<String, ()>> = Arc::new(KeyedLockRegistry::new());
        let a = registry.get_or_insert_with("a".to_string(), || ());
        let b = registry.get_or_insert_with("b".to_string(), || ());

        let guard_a = a.lock();
        // Must not deadlock: "b"'s cell is independent of "a"'s.
        let _guard_b = b.lock();
        drop(guard_a);
    }
}
