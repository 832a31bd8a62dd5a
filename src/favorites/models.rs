use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Events,
    Venues,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Events => "events",
            Category::Venues => "venues",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "events" | "event" => Ok(Category::Events),
            "venues" | "venue" => Ok(Category::Venues),
            _ => Err(AppError::InvalidCategory(s.to_string())),
        }
    }
}

/// A favorited event or venue. The name is captured when favoriting and is
/// never refreshed from the catalog afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteItem {
    pub id: i64,
    #[serde(rename = "type")]
    pub category: Category,
    #[serde(rename = "name")]
    pub display_name: String,
}

impl FavoriteItem {
    pub fn new(id: i64, category: Category, display_name: impl Into<String>) -> Self {
        Self {
            id,
            category,
            display_name: display_name.into(),
        }
    }

    pub fn matches(&self, id: i64, category: Category) -> bool {
        self.id == id && self.category == category
    }

    /// Route of the detail view for this item, e.g. `/events/42`.
    pub fn detail_path(&self) -> String {
        format!("/{}/{}", self.category, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persisted_field_names() {
        let item = FavoriteItem::new(42, Category::Events, "Concert X");
        let json = serde_json::to_value(&item).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "id": 42, "type": "events", "name": "Concert X" })
        );
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let parsed: Result<FavoriteItem, _> =
            serde_json::from_str(r#"{"id": 1, "type": "teams", "name": "X"}"#);
        assert!(parsed.is_err());

        assert!(matches!(
            "teams".parse::<Category>(),
            Err(AppError::InvalidCategory(_))
        ));
        assert_eq!("Venues".parse::<Category>().unwrap(), Category::Venues);
    }

    #[test]
    fn test_detail_path() {
        let item = FavoriteItem::new(7, Category::Venues, "Venue Y");
        assert_eq!(item.detail_path(), "/venues/7");
    }
}
