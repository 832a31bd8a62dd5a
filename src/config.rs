use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const APP_NAME: &str = "eventscout";
pub const STORAGE_FILE: &str = "storage.db";
pub const SEATGEEK_BASE_URL: &str = "https://api.seatgeek.com/2";
pub const REQUEST_TIMEOUT_SECONDS: u64 = 10;
pub const DEFAULT_PAGE_SIZE: u32 = 24;
pub const SEARCH_DEBOUNCE_MS: u64 = 500;
pub const SYNC_INTERVAL_MS: u64 = 500;

pub const ENV_DATA_DIR: &str = "EVENTSCOUT_DATA_DIR";
pub const ENV_CLIENT_ID: &str = "SEATGEEK_CLIENT_ID";
pub const ENV_BASE_URL: &str = "SEATGEEK_BASE_URL";
pub const ENV_SYNC_INTERVAL_MS: &str = "EVENTSCOUT_SYNC_INTERVAL_MS";

pub fn get_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the on-device storage file.
    pub data_dir: PathBuf,
    pub api_base_url: String,
    pub client_id: Option<String>,
    pub request_timeout_secs: u64,
    pub page_size: u32,
    pub search_debounce_ms: u64,
    /// How often the storage file is polled for writes made by other processes.
    pub sync_interval_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: get_data_dir(),
            api_base_url: SEATGEEK_BASE_URL.to_string(),
            client_id: None,
            request_timeout_secs: REQUEST_TIMEOUT_SECONDS,
            page_size: DEFAULT_PAGE_SIZE,
            search_debounce_ms: SEARCH_DEBOUNCE_MS,
            sync_interval_ms: SYNC_INTERVAL_MS,
        }
    }
}

impl AppConfig {
    /// Defaults overridden by whatever the environment provides.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.trim().is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(id) = lookup(ENV_CLIENT_ID).filter(|v| !v.trim().is_empty()) {
            config.client_id = Some(id);
        }
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            config.api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(raw) = lookup(ENV_SYNC_INTERVAL_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => config.sync_interval_ms = ms,
                _ => log::warn!(
                    "Ignoring invalid {}={:?}, keeping {}ms",
                    ENV_SYNC_INTERVAL_MS,
                    raw,
                    config.sync_interval_ms
                ),
            }
        }

        config
    }

    pub fn storage_path(&self) -> PathBuf {
        self.data_dir.join(STORAGE_FILE)
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_millis(self.sync_interval_ms)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
