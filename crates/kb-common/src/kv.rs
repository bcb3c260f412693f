/// Narrow key-value persistence port.
///
/// The knowledge base only needs `get` and `set` on string values. Backends
/// degrade instead of failing: a `get` that cannot reach storage returns
/// `None`, a `set` that cannot reach storage returns `false`.
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use tracing::warn;

use crate::redis::RedisCache;

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = Option<String>> + Send;

    fn set(&self, key: &str, value: &str) -> impl Future<Output = bool> + Send;
}

impl KeyValueStore for RedisCache {
    async fn get(&self, key: &str) -> Option<String> {
        RedisCache::get(self, key).await
    }

    async fn set(&self, key: &str, value: &str) -> bool {
        RedisCache::set(self, key, value).await
    }
}

/// In-process store for tests. Without Redis the server runs on
/// `RedisCache::disabled()` instead.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Option<String> {
        let entries = self
            .entries
            .lock()
            .inspect_err(|_| warn!(key, "memory store lock poisoned"))
            .ok()?;
        entries.get(key).cloned()
    }

    async fn set(&self, key: &str, value: &str) -> bool {
        let Ok(mut entries) = self.entries.lock() else {
            warn!(key, "memory store lock poisoned");
            return false;
        };
        entries.insert(key.to_string(), value.to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(KeyValueStore::get(&store, "favorites").await, None);

        assert!(KeyValueStore::set(&store, "favorites", "[\"1-overview\"]").await);
        assert_eq!(
            KeyValueStore::get(&store, "favorites").await.as_deref(),
            Some("[\"1-overview\"]")
        );

        assert!(KeyValueStore::set(&store, "favorites", "[]").await);
        assert_eq!(store.len(), 1);
        assert_eq!(KeyValueStore::get(&store, "favorites").await.as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn redis_backend_without_client_reports_nothing() {
        let cache = RedisCache::disabled();
        assert_eq!(KeyValueStore::get(&cache, "favorites").await, None);
        assert!(!KeyValueStore::set(&cache, "favorites", "[]").await);
    }
}
