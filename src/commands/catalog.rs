use serde::Serialize;

use crate::browse::{Pagination, SearchState};
use crate::context::AppContext;
use crate::errors::Result;
use crate::favorites::FavoritesStore;
use crate::seatgeek::models::{Event, EventQuery, Venue, VenueQuery};

/// A catalog row together with its favorite state.
#[derive(Debug, Clone, Serialize)]
pub struct Listing<T> {
    pub item: T,
    pub is_favorite: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListingPage<T> {
    pub items: Vec<Listing<T>>,
    pub pagination: Pagination,
}

fn event_listing(store: &FavoritesStore, event: Event) -> Listing<Event> {
    let favorite = event.to_favorite();
    Listing {
        is_favorite: store.is_favorite(favorite.id, favorite.category),
        item: event,
    }
}

fn venue_listing(store: &FavoritesStore, venue: Venue) -> Listing<Venue> {
    let favorite = venue.to_favorite();
    Listing {
        is_favorite: store.is_favorite(favorite.id, favorite.category),
        item: venue,
    }
}

pub async fn search_events(ctx: &AppContext, query: &EventQuery) -> Result<ListingPage<Event>> {
    let store = ctx.use_favorites()?;
    let page = ctx.use_catalog()?.search_events(query).await?;

    Ok(ListingPage {
        pagination: Pagination::from_meta(&page.meta),
        items: page
            .events
            .into_iter()
            .map(|event| event_listing(store, event))
            .collect(),
    })
}

pub async fn get_event(ctx: &AppContext, id: i64) -> Result<Listing<Event>> {
    let store = ctx.use_favorites()?;
    let event = ctx.use_catalog()?.get_event(id).await?;
    Ok(event_listing(store, event))
}

pub async fn search_venues(ctx: &AppContext, query: &VenueQuery) -> Result<ListingPage<Venue>> {
    let store = ctx.use_favorites()?;
    let page = ctx.use_catalog()?.search_venues(query).await?;

    Ok(ListingPage {
        pagination: Pagination::from_meta(&page.meta),
        items: page
            .venues
            .into_iter()
            .map(|venue| venue_listing(store, venue))
            .collect(),
    })
}

pub async fn get_venue(ctx: &AppContext, id: i64) -> Result<Listing<Venue>> {
    let store = ctx.use_favorites()?;
    let venue = ctx.use_catalog()?.get_venue(id).await?;
    Ok(venue_listing(store, venue))
}

/// The events page a listing view shows for its search box state.
pub async fn browse_events(
    ctx: &AppContext,
    search: &SearchState,
    base: &EventQuery,
) -> Result<ListingPage<Event>> {
    let query = EventQuery {
        q: search.query.clone(),
        page: search.page,
        ..base.clone()
    };
    search_events(ctx, &query).await
}

pub async fn browse_venues(
    ctx: &AppContext,
    search: &SearchState,
    base: &VenueQuery,
) -> Result<ListingPage<Venue>> {
    let query = VenueQuery {
        q: search.query.clone(),
        page: search.page,
        ..base.clone()
    };
    search_venues(ctx, &query).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::LocalStorage;
    use crate::errors::AppError;
    use crate::favorites::{Category, FavoriteItem};
    use crate::providers::CatalogProvider;
    use crate::seatgeek::error::CatalogError;
    use crate::seatgeek::models::{EventsPage, Meta, VenueSummary, VenuesPage};
    use crate::storage::MemoryStorage;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct FakeCatalog;

    fn event(id: i64, title: &str) -> Event {
        Event {
            id,
            short_title: title.to_string(),
            datetime_utc: "2024-05-04T19:00:00".parse().unwrap(),
            datetime_local: None,
            performers: Vec::new(),
            venue: VenueSummary {
                id: Some(9),
                name_v2: "Big Hall".to_string(),
                display_location: "Boston, MA".to_string(),
            },
            url: None,
        }
    }

    fn venue(id: i64, name: &str) -> Venue {
        serde_json::from_value(serde_json::json!({ "id": id, "name_v2": name })).unwrap()
    }

    #[async_trait]
    impl CatalogProvider for FakeCatalog {
        fn id(&self) -> &str {
            "fake"
        }

        async fn search_events(&self, query: &EventQuery) -> std::result::Result<EventsPage, CatalogError> {
            Ok(EventsPage {
                events: vec![event(1, "Concert X"), event(2, "Concert Z")],
                meta: Meta {
                    total: 30,
                    per_page: query.per_page,
                    page: query.page,
                },
            })
        }

        async fn search_venues(&self, query: &VenueQuery) -> std::result::Result<VenuesPage, CatalogError> {
            Ok(VenuesPage {
                venues: vec![venue(9, "Big Hall")],
                meta: Meta {
                    total: 1,
                    per_page: query.per_page,
                    page: query.page,
                },
            })
        }

        async fn get_event(&self, id: i64) -> std::result::Result<Event, CatalogError> {
            if id == 1 {
                Ok(event(1, "Concert X"))
            } else {
                Err(CatalogError::NotFound(format!("event {}", id)))
            }
        }

        async fn get_venue(&self, id: i64) -> std::result::Result<Venue, CatalogError> {
            Ok(venue(id, "Big Hall"))
        }
    }

    async fn context() -> AppContext {
        let storage = LocalStorage::new(Arc::new(MemoryStorage::new()));
        let store = FavoritesStore::new(&storage).unwrap();
        store.ready().await;
        AppContext::new()
            .with_favorites(store)
            .with_catalog(Arc::new(FakeCatalog))
    }

    #[tokio::test]
    async fn test_event_rows_carry_favorite_flag() {
        let ctx = context().await;
        ctx.use_favorites()
            .unwrap()
            .add_favorite(FavoriteItem::new(2, Category::Events, "Concert Z"));

        let page = search_events(&ctx, &EventQuery::default()).await.unwrap();

        let flags: Vec<(i64, bool)> = page.items.iter().map(|l| (l.item.id, l.is_favorite)).collect();
        assert_eq!(flags, vec![(1, false), (2, true)]);
        assert_eq!(page.pagination.total_pages(), 2);
    }

    #[tokio::test]
    async fn test_event_and_venue_with_same_id_do_not_mix() {
        let ctx = context().await;
        ctx.use_favorites()
            .unwrap()
            .add_favorite(FavoriteItem::new(1, Category::Venues, "Somewhere"));

        assert!(!get_event(&ctx, 1).await.unwrap().is_favorite);
        assert!(get_venue(&ctx, 1).await.unwrap().is_favorite);

        let venues = search_venues(&ctx, &VenueQuery::default()).await.unwrap();
        assert!(!venues.items[0].is_favorite);
        assert!(venues.pagination.is_last_page());
    }

    #[tokio::test]
    async fn test_missing_event_maps_to_not_found() {
        let ctx = context().await;

        let err = get_event(&ctx, 404).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref what) if what == "event 404"));
    }

    #[tokio::test]
    async fn test_listing_without_catalog_fails() {
        let storage = LocalStorage::new(Arc::new(MemoryStorage::new()));
        let ctx = AppContext::new().with_favorites(FavoritesStore::new(&storage).unwrap());

        let err = search_venues(&ctx, &VenueQuery::default()).await.unwrap_err();
        assert!(matches!(err, AppError::MissingProvider(_)));
    }

    #[tokio::test]
    async fn test_browse_follows_search_state() {
        let ctx = context().await;
        let mut search = SearchState::default();
        search.settle("x");

        let first = browse_events(&ctx, &search, &EventQuery::default()).await.unwrap();
        assert_eq!(first.pagination.page, 1);

        assert!(search.next_page(&first.pagination));
        let second = browse_events(&ctx, &search, &EventQuery::default()).await.unwrap();
        assert_eq!(second.pagination.page, 2);
        assert!(second.pagination.is_last_page());

        let venues = browse_venues(&ctx, &search, &VenueQuery::default()).await.unwrap();
        assert_eq!(venues.pagination.page, 2);
    }
}
