use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::{StorageArea, StorageEvent, EVENT_CAPACITY};
use crate::errors::Result;

/// In-memory storage area. Clones share state, which makes two clones behave
/// like two tabs looking at the same storage.
#[derive(Clone)]
pub struct MemoryStorage {
    items: Arc<RwLock<HashMap<String, String>>>,
    events: broadcast::Sender<StorageEvent>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            items: Arc::new(RwLock::new(HashMap::new())),
            events,
        }
    }

    /// Seed a value without announcing it, as if it was left over from an
    /// earlier session.
    pub fn with_item(self, key: &str, value: &str) -> Self {
        self.items.write().insert(key.to_string(), value.to_string());
        self
    }

    /// Raw stored value, bypassing the async interface.
    pub fn peek(&self, key: &str) -> Option<String> {
        self.items.read().get(key).cloned()
    }

    fn announce(&self, key: &str, new_value: Option<String>, origin: Uuid) {
        // No receivers is fine.
        let _ = self.events.send(StorageEvent {
            key: key.to_string(),
            new_value,
            origin,
        });
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageArea for MemoryStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.read().get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str, origin: Uuid) -> Result<()> {
        self.items.write().insert(key.to_string(), value.to_string());
        self.announce(key, Some(value.to_string()), origin);
        Ok(())
    }

    async fn remove_item(&self, key: &str, origin: Uuid) -> Result<()> {
        let removed = self.items.write().remove(key);
        if removed.is_some() {
            self.announce(key, None, origin);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_clones_share_items_and_events() {
        let tab_a = MemoryStorage::new();
        let tab_b = tab_a.clone();
        let mut feed = tab_b.subscribe();
        let origin = Uuid::new_v4();

        tab_a.set_item("favorites", "[]", origin).await.unwrap();

        assert_eq!(tab_b.get_item("favorites").await.unwrap().as_deref(), Some("[]"));
        let event = feed.recv().await.unwrap();
        assert_eq!(event.key, "favorites");
        assert_eq!(event.new_value.as_deref(), Some("[]"));
        assert_eq!(event.origin, origin);
    }

    #[tokio::test]
    async fn test_remove_missing_is_silent() {
        let storage = MemoryStorage::new();
        let mut feed = storage.subscribe();

        storage.remove_item("nothing", Uuid::new_v4()).await.unwrap();

        assert!(feed.try_recv().is_err());
        assert_eq!(storage.get_item("nothing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_seeded_item_is_readable() {
        let storage = MemoryStorage::new().with_item("favorites", "not json");
        assert_eq!(storage.peek("favorites").as_deref(), Some("not json"));
    }
}
