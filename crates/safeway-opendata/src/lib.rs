//! Client for the municipal open-data API.
//!
//! Fetches CCTV and streetlight positions page by page, retrying transient
//! failures with exponential back-off, and keeps the full datasets in a
//! shared cache for scoring.

pub mod cache;
pub mod client;
pub mod error;
pub(crate) mod retry;
pub mod types;

pub use cache::{InfrastructureCache, InfrastructureSnapshot};
pub use client::{OpenDataClient, OpenDataSettings};
pub use error::OpenDataError;
pub use types::{row_coordinate, ServicePage, ServiceResult};
