pub mod client;
pub mod error;
pub mod models;

pub use client::SeatGeekClient;
pub use error::CatalogError;
pub use models::*;
