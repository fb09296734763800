//! Memoizing map keyed by canonicalized sets
//!
//! Used for computations whose result only depends on an unordered set of
//! inputs, such as merging two exclude rule sets. Callers canonicalize their
//! key with [`canonical_set_key`] so `merge(a, b)` and `merge(b, a)` share one
//! entry. A single lock guards the whole map; values are computed while it is
//! held, so every key is computed at most once.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;

pub struct MemoCache<K, V> {
    entries: Mutex<HashMap<K, V>>,
}

impl<K, V> MemoCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.lock().get(key).cloned()
    }

    /// Return the memoized value for `key`, computing and storing it on a miss.
    ///
    /// A failed computation stores nothing.
    pub fn get_or_try_insert_with<E, F>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce(&K) -> Result<V, E>,
    {
        let mut entries = self.entries.lock();
        if let Some(value) = entries.get(&key) {
            return Ok(value.clone());
        }
        let value = compute(&key)?;
        entries.insert(key, value.clone());
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl<K, V> Default for MemoCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> std::fmt::Debug for MemoCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoCache")
            .field("entries", &self.entries.lock().len())
            .finish()
    }
}

/// Sorted, de-duplicated key for an unordered collection of items
pub fn canonical_set_key<I, T>(items: I) -> Vec<T>
where
    I: IntoIterator<Item = T>,
    T: Ord,
{
    let mut key: Vec<T> = items.into_iter().collect();
    key.sort();
    key.dedup();
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_computes_once_per_key() {
        let cache: MemoCache<Vec<&str>, usize> = MemoCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = cache
                .get_or_try_insert_with(vec!["a", "b"], |key| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ()>(key.len())
                })
                .unwrap();
            assert_eq!(value, 2);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failed_computation_is_not_stored() {
        let cache: MemoCache<String, u32> = MemoCache::new();
        let result = cache.get_or_try_insert_with("bad".to_string(), |_| Err("boom"));
        assert_eq!(result, Err("boom"));
        assert!(cache.is_empty());
        assert_eq!(cache.get(&"bad".to_string()), None);
    }

    #[test]
    fn test_canonical_key_is_order_independent() {
        let left = canonical_set_key(vec!["**/*~", ".git", ".git"]);
        let right = canonical_set_key(vec![".git", "**/*~"]);
        assert_eq!(left, right);
        assert_eq!(left, vec!["**/*~", ".git"]);
    }

    #[test]
    fn test_shared_between_threads() {
        let cache: MemoCache<u32, u32> = MemoCache::new();
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for key in 0..16 {
                        let value = cache
                            .get_or_try_insert_with(key, |k| Ok::<_, ()>(k * 2))
                            .unwrap();
                        assert_eq!(value, key * 2);
                    }
                });
            }
        });
        assert_eq!(cache.len(), 16);
    }
}
