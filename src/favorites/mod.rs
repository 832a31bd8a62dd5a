pub mod models;

use tokio::sync::watch;

use crate::cell::{LocalStorage, PersistentCell, Snapshot};
use crate::errors::Result;
pub use models::{Category, FavoriteItem};

/// Storage key holding the favorites collection.
pub const FAVORITES_KEY: &str = "favorites";

/// The favorites collection, shared by every view for the whole session.
///
/// At most one item exists per `(id, category)`. Mutations are applied to
/// the current collection under the cell lock, so concurrent callers cannot
/// produce duplicates or lose each other's changes.
#[derive(Clone)]
pub struct FavoritesStore {
    cell: PersistentCell<Vec<FavoriteItem>>,
}

impl FavoritesStore {
    pub fn new(storage: &LocalStorage) -> Result<Self> {
        let cell = storage.slot(FAVORITES_KEY, Vec::new())?;
        Ok(Self { cell })
    }

    /// Snapshot of the collection in insertion order. Empty while loading.
    pub fn favorites(&self) -> Vec<FavoriteItem> {
        self.cell.get()
    }

    pub fn favorites_in(&self, category: Category) -> Vec<FavoriteItem> {
        self.cell.with(|items| {
            items
                .iter()
                .filter(|item| item.category == category)
                .cloned()
                .collect()
        })
    }

    pub fn is_favorite(&self, id: i64, category: Category) -> bool {
        self.cell
            .with(|items| items.iter().any(|item| item.matches(id, category)))
    }

    pub fn add_favorite(&self, item: FavoriteItem) {
        log::debug!("Adding favorite {} '{}'", item.detail_path(), item.display_name);
        self.cell.update(move |items| {
            if items.iter().any(|f| f.matches(item.id, item.category)) {
                return items.clone();
            }
            let mut next = items.clone();
            next.push(item.clone());
            next
        });
    }

    pub fn remove_favorite(&self, id: i64, category: Category) {
        log::debug!("Removing favorite /{}/{}", category, id);
        self.cell.update(move |items| {
            items
                .iter()
                .filter(|f| !f.matches(id, category))
                .cloned()
                .collect()
        });
    }

    /// Adds the item if absent, removes it otherwise. Returns whether it is a
    /// favorite afterwards.
    pub fn toggle_favorite(&self, id: i64, name: &str, category: Category) -> bool {
        let item = FavoriteItem::new(id, category, name);
        self.cell.update(move |items| {
            if items.iter().any(|f| f.matches(item.id, item.category)) {
                items
                    .iter()
                    .filter(|f| !f.matches(item.id, item.category))
                    .cloned()
                    .collect()
            } else {
                let mut next = items.clone();
                next.push(item.clone());
                next
            }
        });
        self.is_favorite(id, category)
    }

    pub fn is_loading(&self) -> bool {
        self.cell.is_loading()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot<Vec<FavoriteItem>>> {
        self.cell.subscribe()
    }

    pub async fn ready(&self) {
        self.cell.ready().await
    }

    pub async fn flush(&self) {
        self.cell.flush().await
    }
}
