pub mod browse;
pub mod cell;
pub mod commands;
pub mod config;
pub mod context;
pub mod errors;
pub mod favorites;
pub mod providers;
pub mod seatgeek;
pub mod storage;

use std::sync::Arc;

use cell::LocalStorage;
use config::AppConfig;
use context::AppContext;
use errors::Result;
use favorites::FavoritesStore;
use seatgeek::SeatGeekClient;
use storage::SqliteStorage;

/// Opens on-device storage, builds the favorites store and the catalog
/// client, and wires them into one context. Call once at start-up.
pub async fn bootstrap(config: &AppConfig) -> Result<AppContext> {
    let area = SqliteStorage::open(&config.storage_path(), config.sync_interval()).await?;
    let storage = LocalStorage::new(Arc::new(area));

    let favorites = FavoritesStore::new(&storage)?;
    let catalog = SeatGeekClient::new(config)?;

    log::info!(
        "Started with storage at {:?} (origin {})",
        config.storage_path(),
        storage.origin()
    );

    Ok(AppContext::new()
        .with_favorites(favorites)
        .with_catalog(Arc::new(catalog)))
}
