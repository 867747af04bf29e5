//! In-memory keyed storage shared by the services
//!
//! Each service owns one `MemoryStore`, injected at construction. Clones share
//! the same underlying map. Entries live for the life of the process; there is
//! no eviction.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// `String`-keyed map behind an async read/write lock
pub struct MemoryStore<V> {
    inner: Arc<RwLock<HashMap<String, V>>>,
}

impl<V> Clone for MemoryStore<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> Default for MemoryStore<V> {
    fn default() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<V: Clone> MemoryStore<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the value stored under `key`
    pub async fn get(&self, key: &str) -> Option<V> {
        self.inner.read().await.get(key).cloned()
    }

    /// Insert or overwrite, returning the previous value
    pub async fn insert(&self, key: impl Into<String>, value: V) -> Option<V> {
        self.inner.write().await.insert(key.into(), value)
    }

    pub async fn remove(&self, key: &str) -> Option<V> {
        self.inner.write().await.remove(key)
    }

    pub async fn contains_key(&self, key: &str) -> bool {
        self.inner.read().await.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Mutate an existing entry in place under a single write lock
    ///
    /// Returns the updated value, or `None` if `key` is absent.
    pub async fn update<F>(&self, key: &str, f: F) -> Option<V>
    where
        F: FnOnce(&mut V),
    {
        let mut map = self.inner.write().await;
        let value = map.get_mut(key)?;
        f(value);
        Some(value.clone())
    }

    /// Compute a replacement from the current value (if any) and store it
    ///
    /// The read, the computation and the write happen under one write lock, so
    /// concurrent callers on the same key are serialized.
    pub async fn replace_with<F>(&self, key: &str, f: F) -> V
    where
        F: FnOnce(Option<V>) -> V,
    {
        let mut map = self.inner.write().await;
        let next = f(map.remove(key));
        map.insert(key.to_string(), next.clone());
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_get_remove() {
        let store = MemoryStore::new();
        assert!(store.is_empty().await);

        assert_eq!(store.insert("a", 1).await, None);
        assert_eq!(store.insert("a", 2).await, Some(1));
        assert_eq!(store.get("a").await, Some(2));
        assert!(store.contains_key("a").await);
        assert_eq!(store.len().await, 1);

        assert_eq!(store.remove("a").await, Some(2));
        assert_eq!(store.remove("a").await, None);
        assert_eq!(store.get("a").await, None);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.insert("k", "v".to_string()).await;
        assert_eq!(other.get("k").await.as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_update_only_touches_existing() {
        let store = MemoryStore::new();
        assert_eq!(store.update("missing", |v: &mut i32| *v += 1).await, None);

        store.insert("n", 41).await;
        assert_eq!(store.update("n", |v| *v += 1).await, Some(42));
        assert_eq!(store.get("n").await, Some(42));
    }

    #[tokio::test]
    async fn test_replace_with_sees_previous_value() {
        let store: MemoryStore<Vec<u8>> = MemoryStore::new();

        let first = store
            .replace_with("k", |prev| {
                assert!(prev.is_none());
                vec![1]
            })
            .await;
        assert_eq!(first, vec![1]);

        let second = store
            .replace_with("k", |prev| {
                let mut v = prev.unwrap();
                v.push(2);
                v
            })
            .await;
        assert_eq!(second, vec![1, 2]);
        assert_eq!(store.get("k").await, Some(vec![1, 2]));
    }
}
