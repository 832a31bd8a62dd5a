use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_PAGE_SIZE;
use crate::favorites::{Category, FavoriteItem};

pub const DEFAULT_SORT: &str = "score.desc";
pub const DEFAULT_EVENT_TYPE: &str = "concert";

/// Display format for event dates, e.g. "Sat, May 4, 2024, 7:00 PM".
const DATETIME_FORMAT: &str = "%a, %b %-d, %Y, %-I:%M %p";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    pub total: u64,
    pub per_page: u32,
    pub page: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Performer {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// The venue fields embedded in an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueSummary {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name_v2: String,
    #[serde(default)]
    pub display_location: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub short_title: String,
    pub datetime_utc: NaiveDateTime,
    #[serde(default)]
    pub datetime_local: Option<NaiveDateTime>,
    #[serde(default)]
    pub performers: Vec<Performer>,
    pub venue: VenueSummary,
    #[serde(default)]
    pub url: Option<String>,
}

impl Event {
    /// Image of the headline performer.
    pub fn image(&self) -> Option<&str> {
        self.performers.first().and_then(|p| p.image.as_deref())
    }

    pub fn display_datetime(&self) -> String {
        format_datetime(&self.datetime_utc)
    }

    pub fn to_favorite(&self) -> FavoriteItem {
        FavoriteItem::new(self.id, Category::Events, self.short_title.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Venue {
    pub id: i64,
    pub name_v2: String,
    #[serde(default)]
    pub display_location: String,
    #[serde(default)]
    pub has_upcoming_events: bool,
    #[serde(default)]
    pub num_upcoming_events: u32,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub extended_address: Option<String>,
    #[serde(default)]
    pub capacity: Option<u64>,
    #[serde(default)]
    pub url: Option<String>,
}

impl Venue {
    pub fn to_favorite(&self) -> FavoriteItem {
        FavoriteItem::new(self.id, Category::Venues, self.name_v2.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsPage {
    pub events: Vec<Event>,
    pub meta: Meta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenuesPage {
    pub venues: Vec<Venue>,
    pub meta: Meta,
}

pub fn format_datetime(datetime: &NaiveDateTime) -> String {
    datetime.format(DATETIME_FORMAT).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub event_type: String,
    pub q: String,
    pub sort: String,
    pub per_page: u32,
    pub page: u32,
}

impl Default for EventQuery {
    fn default() -> Self {
        Self {
            event_type: DEFAULT_EVENT_TYPE.to_string(),
            q: String::new(),
            sort: DEFAULT_SORT.to_string(),
            per_page: DEFAULT_PAGE_SIZE,
            page: 1,
        }
    }
}

impl EventQuery {
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("type", self.event_type.clone()),
            ("sort", self.sort.clone()),
            ("per_page", self.per_page.to_string()),
            ("page", self.page.max(1).to_string()),
        ];
        if !self.q.trim().is_empty() {
            params.push(("q", self.q.trim().to_string()));
        }
        params
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenueQuery {
    pub q: String,
    pub sort: String,
    pub per_page: u32,
    pub page: u32,
}

impl Default for VenueQuery {
    fn default() -> Self {
        Self {
            q: String::new(),
            sort: DEFAULT_SORT.to_string(),
            per_page: DEFAULT_PAGE_SIZE,
            page: 1,
        }
    }
}

impl VenueQuery {
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("sort", self.sort.clone()),
            ("per_page", self.per_page.to_string()),
            ("page", self.page.max(1).to_string()),
        ];
        if !self.q.trim().is_empty() {
            params.push(("q", self.q.trim().to_string()));
        }
        params
    }
}
