//! Client for the map service's local search REST API.
//!
//! Resolves free-text place names to coordinates (keyword search, falling
//! back to address search) and coordinates back to address labels.

pub mod client;
pub mod error;
pub mod types;

pub use client::GeocodeClient;
pub use error::GeocodeError;
pub use types::{AddressDocument, KeywordDocument, PlaceMatch, RegionDocument};
