//! Unbounded result memoization for pipeline stages.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use tokio::sync::RwLock;
use tracing::debug;

/// Caches computed values by key. Entries never expire.
pub struct MemoCache<K, V> {
    name: &'static str,
    entries: RwLock<HashMap<K, V>>,
}

impl<K, V> MemoCache<K, V>
where
    K: Eq + Hash + std::fmt::Debug,
    V: Clone,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        self.entries.read().await.get(key).cloned()
    }

    /// Return the cached value for `key`, or run `compute` and cache its output.
    ///
    /// The lock is not held while `compute` runs; two concurrent misses on the
    /// same key both compute and the later insert wins.
    pub async fn get_or_compute<F, Fut>(&self, key: K, compute: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        if let Some(value) = self.get(&key).await {
            debug!(cache = self.name, ?key, "Cache hit");
            return value;
        }

        debug!(cache = self.name, ?key, "Cache miss");
        let value = compute().await;
        self.entries.write().await.insert(key, value.clone());
        value
    }

    pub async fn invalidate(&self, key: &K) {
        self.entries.write().await.remove(key);
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
