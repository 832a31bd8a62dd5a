use async_trait::async_trait;

use crate::seatgeek::error::CatalogError;
use crate::seatgeek::models::{Event, EventQuery, EventsPage, Venue, VenueQuery, VenuesPage};

/// Remote source of events and venues.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Unique identifier (e.g., "seatgeek")
    fn id(&self) -> &str;

    /// Listings
    async fn search_events(&self, query: &EventQuery) -> Result<EventsPage, CatalogError>;
    async fn search_venues(&self, query: &VenueQuery) -> Result<VenuesPage, CatalogError>;

    /// Details
    async fn get_event(&self, id: i64) -> Result<Event, CatalogError>;
    async fn get_venue(&self, id: i64) -> Result<Venue, CatalogError>;
}
