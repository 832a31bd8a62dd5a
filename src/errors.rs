use serde::Serialize;
use thiserror::Error;

use crate::seatgeek::error::CatalogError;

#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("File system error: {0}")]
    FileSystem(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid category: {0}")]
    InvalidCategory(String),

    /// A storage slot was requested with a different value type than the
    /// one it was first opened with.
    #[error("Storage slot '{0}' is already open with a different value type")]
    SlotType(String),

    /// Something reached for a service that was never provided to the
    /// application context.
    #[error("{0} must be used within a provider that supplies it")]
    MissingProvider(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

// Implement From traits for common error types to simplify conversion

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Database(e.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::FileSystem(e.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Serialization(e.to_string())
    }
}

impl From<CatalogError> for AppError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::NotFound(what) => AppError::NotFound(what),
            CatalogError::Parse(msg) => AppError::Serialization(msg),
            other => AppError::Network(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_tagged() {
        let err = AppError::MissingProvider("useFavorites".to_string());
        let json = serde_json::to_value(&err).unwrap();

        assert_eq!(json["type"], "MissingProvider");
        assert_eq!(json["message"], "useFavorites");
    }

    #[test]
    fn test_catalog_not_found_maps_to_not_found() {
        let err: AppError = CatalogError::NotFound("event 7".to_string()).into();
        assert!(matches!(err, AppError::NotFound(ref what) if what == "event 7"));
    }
}
