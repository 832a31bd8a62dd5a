//! SQLite-backed storage area.
//!
//! Every slot is one row. Each write stamps the row with a revision taken
//! from a single counter shared by the whole table, which gives the poller a
//! cheap "what changed since" query:
//!
//! ```text
//! [process A] set_item ──► storage_slots (revision 7) ◄── poll (revision > 6) ── [process B]
//! ```
//!
//! Removal keeps the row with a NULL value so the change still has a
//! revision other processes can see.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

use super::{StorageArea, StorageEvent, EVENT_CAPACITY};
use crate::errors::{AppError, Result};

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

pub struct SqliteStorage {
    pool: Pool<Sqlite>,
    events: broadcast::Sender<StorageEvent>,
    poller: JoinHandle<()>,
}

impl SqliteStorage {
    /// Open (creating if needed) the storage file and start watching it for
    /// changes every `poll_interval`.
    pub async fn open(path: &Path, poll_interval: Duration) -> Result<Self> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }

        log::info!("Opening storage at: {:?}", path);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(
                SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(true)
                    .journal_mode(SqliteJournalMode::Wal),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to open storage: {}", e)))?;

        let schema = include_str!("schema.sql");

        for statement in schema.split(';') {
            let stmt = statement.trim();
            if !stmt.is_empty() {
                sqlx::query(stmt).execute(&pool).await.map_err(|e| {
                    AppError::Database(format!(
                        "Failed to execute schema statement '{}': {}",
                        stmt, e
                    ))
                })?;
            }
        }

        let (last_revision,): (i64,) =
            sqlx::query_as("SELECT COALESCE(MAX(revision), 0) FROM storage_slots")
                .fetch_one(&pool)
                .await?;

        // tokio's interval panics on a zero period.
        let poll_interval = poll_interval.max(MIN_POLL_INTERVAL);

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let poller = tokio::spawn(poll_changes(
            pool.clone(),
            events.clone(),
            last_revision,
            poll_interval,
        ));

        Ok(Self {
            pool,
            events,
            poller,
        })
    }

    /// Stop polling and close the connection pool.
    pub async fn close(&self) {
        self.poller.abort();
        self.pool.close().await;
    }
}

impl Drop for SqliteStorage {
    fn drop(&mut self) {
        self.poller.abort();
    }
}

async fn poll_changes(
    pool: Pool<Sqlite>,
    events: broadcast::Sender<StorageEvent>,
    mut last_revision: i64,
    poll_interval: Duration,
) {
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let rows: Vec<(String, Option<String>, i64, String)> = match sqlx::query_as(
            "SELECT key, value, revision, origin FROM storage_slots WHERE revision > ? ORDER BY revision",
        )
        .bind(last_revision)
        .fetch_all(&pool)
        .await
        {
            Ok(rows) => rows,
            Err(e) => {
                log::warn!("Storage poll failed: {}", e);
                continue;
            }
        };

        for (key, new_value, revision, origin) in rows {
            last_revision = last_revision.max(revision);
            let origin = Uuid::parse_str(&origin).unwrap_or_else(|_| Uuid::nil());
            log::debug!("Storage change on '{}' (revision {})", key, revision);
            let _ = events.send(StorageEvent {
                key,
                new_value,
                origin,
            });
        }
    }
}

#[async_trait]
impl StorageArea for SqliteStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(Option<String>,)> =
            sqlx::query_as("SELECT value FROM storage_slots WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.and_then(|(value,)| value))
    }

    async fn set_item(&self, key: &str, value: &str, origin: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO storage_slots (key, value, revision, origin, updated_at)
            VALUES (?, ?, (SELECT COALESCE(MAX(revision), 0) + 1 FROM storage_slots), ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                revision = excluded.revision,
                origin = excluded.origin,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(origin.to_string())
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove_item(&self, key: &str, origin: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE storage_slots
            SET value = NULL,
                revision = (SELECT COALESCE(MAX(revision), 0) + 1 FROM storage_slots),
                origin = ?,
                updated_at = ?
            WHERE key = ? AND value IS NOT NULL
            "#,
        )
        .bind(origin.to_string())
        .bind(Utc::now().timestamp())
        .bind(key)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    const POLL: Duration = Duration::from_millis(20);

    #[tokio::test]
    async fn test_set_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SqliteStorage::open(&dir.path().join("storage.db"), POLL)
            .await
            .unwrap();
        let origin = Uuid::new_v4();

        assert_eq!(storage.get_item("favorites").await.unwrap(), None);

        storage.set_item("favorites", "[1]", origin).await.unwrap();
        storage.set_item("favorites", "[2]", origin).await.unwrap();
        assert_eq!(
            storage.get_item("favorites").await.unwrap().as_deref(),
            Some("[2]")
        );

        storage.remove_item("favorites", origin).await.unwrap();
        assert_eq!(storage.get_item("favorites").await.unwrap(), None);

        storage.close().await;
    }

    #[tokio::test]
    async fn test_creates_missing_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("storage.db");

        let storage = SqliteStorage::open(&path, POLL).await.unwrap();
        assert!(path.exists());

        storage.close().await;
    }

    #[tokio::test]
    async fn test_other_handle_sees_writes_through_poller() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.db");
        let writer = SqliteStorage::open(&path, POLL).await.unwrap();
        let watcher = SqliteStorage::open(&path, POLL).await.unwrap();
        let mut feed = watcher.subscribe();
        let origin = Uuid::new_v4();

        writer.set_item("favorites", "[]", origin).await.unwrap();

        let event = timeout(Duration::from_secs(5), feed.recv())
            .await
            .expect("change was never observed")
            .unwrap();
        assert_eq!(event.key, "favorites");
        assert_eq!(event.new_value.as_deref(), Some("[]"));
        assert_eq!(event.origin, origin);

        writer.remove_item("favorites", origin).await.unwrap();

        let event = timeout(Duration::from_secs(5), feed.recv())
            .await
            .expect("removal was never observed")
            .unwrap();
        assert_eq!(event.new_value, None);

        writer.close().await;
        watcher.close().await;
    }

    #[tokio::test]
    async fn test_zero_poll_interval_still_polls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.db");
        let writer = SqliteStorage::open(&path, POLL).await.unwrap();
        let watcher = SqliteStorage::open(&path, Duration::ZERO).await.unwrap();
        let mut feed = watcher.subscribe();

        writer
            .set_item("favorites", "[3]", Uuid::new_v4())
            .await
            .unwrap();

        let event = timeout(Duration::from_secs(5), feed.recv())
            .await
            .expect("poller stopped")
            .unwrap();
        assert_eq!(event.new_value.as_deref(), Some("[3]"));

        writer.close().await;
        watcher.close().await;
    }

    #[tokio::test]
    async fn test_existing_rows_are_not_replayed_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.db");
        let first = SqliteStorage::open(&path, POLL).await.unwrap();
        first
            .set_item("favorites", "[]", Uuid::new_v4())
            .await
            .unwrap();
        first.close().await;

        let second = SqliteStorage::open(&path, POLL).await.unwrap();
        let mut feed = second.subscribe();

        let replayed = timeout(Duration::from_millis(200), feed.recv()).await;
        assert!(replayed.is_err());
        assert_eq!(
            second.get_item("favorites").await.unwrap().as_deref(),
            Some("[]")
        );

        second.close().await;
    }
}
