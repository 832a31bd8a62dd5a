//! On-device key/value storage areas.
//!
//! A [`StorageArea`] is a flat map of string keys to serialized string values,
//! shared by every handle that opens it. Writes carry the origin id of the
//! handle that made them, and every change is announced on a broadcast feed
//! so that handles in other tabs or processes can pick it up.
//!
//! - [`MemoryStorage`] keeps everything in memory. Clones share the same map
//!   and the same change feed.
//! - [`SqliteStorage`] persists to a SQLite file and polls it for writes made
//!   by other processes.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::errors::Result;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

/// Capacity of the change feed. Lagging subscribers skip ahead.
pub const EVENT_CAPACITY: usize = 256;

/// A change to one key of a storage area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    /// `None` when the key was removed.
    pub new_value: Option<String>,
    /// Handle that made the change.
    pub origin: Uuid,
}

#[async_trait]
pub trait StorageArea: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    async fn set_item(&self, key: &str, value: &str, origin: Uuid) -> Result<()>;

    async fn remove_item(&self, key: &str, origin: Uuid) -> Result<()>;

    /// Subscribe to changes made by any handle of this area.
    fn subscribe(&self) -> broadcast::Receiver<StorageEvent>;
}
