/// Favorites persistence over the key-value port.
///
/// The favorites list is stored as one JSON array of `"{appId}-{menuItem}"`
/// keys under a single storage key. Read and write failures degrade: a
/// missing or malformed payload loads as an empty list.
use tracing::{debug, warn};

use kb_common::kv::KeyValueStore;

pub const DEFAULT_FAVORITES_KEY: &str = "knowledgebase-favorites";

pub struct FavoritesStore<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> FavoritesStore<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub async fn load(&self) -> Vec<String> {
        let Some(json) = self.store.get(&self.key).await else {
            debug!(key = %self.key, "no stored favorites");
            return Vec::new();
        };
        serde_json::from_str(&json)
            .inspect_err(|e| warn!(error = %e, key = %self.key, "failed to parse stored favorites"))
            .unwrap_or_default()
    }

    /// Returns `true` if the backend accepted the write.
    pub async fn save(&self, favorites: &[String]) -> bool {
        let Ok(json) = serde_json::to_string(favorites) else {
            return false;
        };
        self.store.set(&self.key, &json).await
    }
}

/// Composite favorites key for a menu item of an application.
pub fn favorite_key(app_id: u64, menu_item: &str) -> String {
    format!("{app_id}-{menu_item}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use kb_common::kv::MemoryStore;

    #[tokio::test]
    async fn empty_store_loads_nothing() {
        let favorites = FavoritesStore::new(MemoryStore::new(), DEFAULT_FAVORITES_KEY);
        assert!(favorites.load().await.is_empty());
    }

    #[tokio::test]
    async fn save_then_load() {
        let favorites = FavoritesStore::new(MemoryStore::new(), DEFAULT_FAVORITES_KEY);
        let list = vec![
            favorite_key(1, "overview"),
            favorite_key(2, "category-4-article-101"),
        ];
        assert!(favorites.save(&list).await);
        assert_eq!(favorites.load().await, list);
    }

    #[tokio::test]
    async fn malformed_payload_loads_empty() {
        let store = MemoryStore::new();
        assert!(KeyValueStore::set(&store, "favs", "{not json").await);
        let favorites = FavoritesStore::new(store, "favs");
        assert_eq!(favorites.key(), "favs");
        assert!(favorites.load().await.is_empty());
    }

    #[test]
    fn key_format() {
        assert_eq!(favorite_key(3, "category-1-article-2"), "3-category-1-article-2");
    }
}
