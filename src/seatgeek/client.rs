use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;

use super::error::CatalogError;
use super::models::*;
use crate::config::AppConfig;
use crate::providers::traits::CatalogProvider;

pub struct SeatGeekClient {
    client: Client,
    base_url: String,
    client_id: Option<String>,
}

impl SeatGeekClient {
    pub fn new(config: &AppConfig) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("eventscout/", env!("CARGO_PKG_VERSION")))
            .build()?;

        if config.client_id.is_none() {
            log::warn!("No SeatGeek client id configured, requests will likely be rejected");
        }

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            client_id: config.client_id.clone(),
        })
    }

    /// Full request URL for `path`, with the client id appended.
    pub fn url(&self, path: &str, params: &[(&str, String)]) -> Result<Url, CatalogError> {
        let raw = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut url = Url::parse(&raw).map_err(|e| CatalogError::InvalidUrl(format!("{}: {}", raw, e)))?;

        {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
            if let Some(ref id) = self.client_id {
                query.append_pair("client_id", id);
            }
        }

        // An empty query_pairs_mut() still leaves a trailing '?'.
        if url.query() == Some("") {
            url.set_query(None);
        }

        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
        what: &str,
    ) -> Result<T, CatalogError> {
        let url = self.url(path, params)?;
        log::debug!("Fetching {} from {}", what, path);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            log::warn!("{} not found at {}", what, path);
            return Err(CatalogError::NotFound(what.to_string()));
        }

        if !status.is_success() {
            log::warn!("Request for {} failed ({})", what, status);
            return Err(CatalogError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text)
            .map_err(|e| CatalogError::Parse(format!("{} at {}: {}", what, path, e)))
    }
}

#[async_trait]
impl CatalogProvider for SeatGeekClient {
    fn id(&self) -> &str {
        "seatgeek"
    }

    async fn search_events(&self, query: &EventQuery) -> Result<EventsPage, CatalogError> {
        self.get_json("events", &query.params(), "events").await
    }

    async fn get_event(&self, id: i64) -> Result<Event, CatalogError> {
        self.get_json(&format!("events/{}", id), &[], &format!("event {}", id))
            .await
    }

    async fn search_venues(&self, query: &VenueQuery) -> Result<VenuesPage, CatalogError> {
        self.get_json("venues", &query.params(), "venues").await
    }

    async fn get_venue(&self, id: i64) -> Result<Venue, CatalogError> {
        self.get_json(&format!("venues/{}", id), &[], &format!("venue {}", id))
            .await
    }
}
