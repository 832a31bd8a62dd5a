//! Entry points the user interface calls into. Each command takes the
//! application context and reports failures as [`crate::errors::AppError`].

pub mod catalog;
pub mod favorites;

pub use catalog::{
    browse_events, browse_venues, get_event, get_venue, search_events, search_venues, Listing,
    ListingPage,
};
pub use favorites::{add_favorite, get_favorites, is_favorite, remove_favorite, toggle_favorite};
