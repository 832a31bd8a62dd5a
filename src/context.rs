//! Application-wide services handed to every view and command.
//!
//! Services are provided once at start-up and reached through the
//! `use_*` accessors. Reaching for a service that was never provided is an
//! integration bug and is reported as [`AppError::MissingProvider`].

use std::sync::Arc;

use crate::errors::{AppError, Result};
use crate::favorites::FavoritesStore;
use crate::providers::CatalogProvider;

#[derive(Clone, Default)]
pub struct AppContext {
    favorites: Option<FavoritesStore>,
    catalog: Option<Arc<dyn CatalogProvider>>,
}

impl AppContext {
    /// A context with nothing provided yet.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_favorites(mut self, store: FavoritesStore) -> Self {
        self.favorites = Some(store);
        self
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn CatalogProvider>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn use_favorites(&self) -> Result<&FavoritesStore> {
        self.favorites
            .as_ref()
            .ok_or_else(|| AppError::MissingProvider("favorites".to_string()))
    }

    pub fn use_catalog(&self) -> Result<&dyn CatalogProvider> {
        self.catalog
            .as_deref()
            .ok_or_else(|| AppError::MissingProvider("catalog".to_string()))
    }
}
