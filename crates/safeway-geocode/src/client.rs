//! HTTP client for the local search REST API.
//!
//! Wraps `reqwest` with key handling, typed response deserialization, and
//! the keyword-then-address fallback used to resolve place names.

use std::time::Duration;

use reqwest::{Client, Url};
use safeway_core::Coordinate;
use serde::de::DeserializeOwned;

use crate::error::GeocodeError;
use crate::types::{
    AddressDocument, DocumentsResponse, KeywordDocument, PlaceMatch, RegionDocument,
};

const DEFAULT_BASE_URL: &str = "https://dapi.kakao.com/";

const KEYWORD_PATH: &str = "v2/local/search/keyword.json";
const ADDRESS_PATH: &str = "v2/local/search/address.json";
const COORD2ADDRESS_PATH: &str = "v2/local/geo/coord2address.json";

/// Client for the local search API.
///
/// Use [`GeocodeClient::new`] for production or
/// [`GeocodeClient::with_base_url`] to point at a mock server in tests.
pub struct GeocodeClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl GeocodeClient {
    /// Creates a client pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, GeocodeError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`GeocodeError::ApiError`] if `base_url` is not a valid URL.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("safeway/0.1 (route-safety)")
            .build()?;

        // Exactly one trailing slash so `Url::join` appends instead of replacing.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| GeocodeError::ApiError {
            status: 0,
            message: format!("invalid base URL '{base_url}': {e}"),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
        })
    }

    /// Resolves a place name to its best-matching coordinate.
    ///
    /// Keyword search runs first; when it has no usable hit, address search
    /// is tried. The top result wins.
    ///
    /// # Errors
    ///
    /// - [`GeocodeError::EmptyQuery`] for a blank query.
    /// - [`GeocodeError::LocationNotFound`] when both searches come back empty.
    /// - [`GeocodeError::Http`], [`GeocodeError::ApiError`], or
    ///   [`GeocodeError::Deserialize`] on transport or response failures.
    pub async fn geocode(&self, query: &str) -> Result<PlaceMatch, GeocodeError> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(GeocodeError::EmptyQuery);
        }

        if let Some(hit) = self
            .search_keyword(trimmed)
            .await?
            .iter()
            .find_map(KeywordDocument::to_match)
        {
            tracing::debug!(query = trimmed, label = %hit.label, "keyword search matched");
            return Ok(hit);
        }

        if let Some(hit) = self
            .search_address(trimmed)
            .await?
            .iter()
            .find_map(AddressDocument::to_match)
        {
            tracing::debug!(query = trimmed, label = %hit.label, "address search matched");
            return Ok(hit);
        }

        tracing::info!(query = trimmed, "no keyword or address match");
        Err(GeocodeError::LocationNotFound {
            query: query.to_owned(),
        })
    }

    /// Raw keyword (place name) search.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] on transport or response failures.
    pub async fn search_keyword(&self, query: &str) -> Result<Vec<KeywordDocument>, GeocodeError> {
        let url = self.build_url(KEYWORD_PATH, &[("query", query), ("size", "5")]);
        let envelope: DocumentsResponse<KeywordDocument> =
            self.request_json(&url, &format!("keyword({query})")).await?;
        Ok(envelope.documents)
    }

    /// Raw structured address search.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] on transport or response failures.
    pub async fn search_address(&self, query: &str) -> Result<Vec<AddressDocument>, GeocodeError> {
        let url = self.build_url(ADDRESS_PATH, &[("query", query)]);
        let envelope: DocumentsResponse<AddressDocument> =
            self.request_json(&url, &format!("address({query})")).await?;
        Ok(envelope.documents)
    }

    /// Address label for a coordinate, `None` when the service has none.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] on transport or response failures.
    pub async fn reverse_geocode(
        &self,
        coordinate: Coordinate,
    ) -> Result<Option<String>, GeocodeError> {
        let x = coordinate.lng.to_string();
        let y = coordinate.lat.to_string();
        let url = self.build_url(COORD2ADDRESS_PATH, &[("x", &x), ("y", &y)]);
        let envelope: DocumentsResponse<RegionDocument> = self
            .request_json(&url, &format!("coord2address({coordinate})"))
            .await?;
        Ok(envelope.documents.iter().find_map(RegionDocument::label))
    }

    fn build_url(&self, path: &str, params: &[(&str, &str)]) -> Url {
        let mut url = self
            .base_url
            .join(path)
            .unwrap_or_else(|_| self.base_url.clone());
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
        }
        url
    }

    /// Sends an authenticated GET and decodes the JSON body.
    ///
    /// Non-2xx responses become [`GeocodeError::ApiError`] carrying the
    /// service's `message` field when present.
    async fn request_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        context: &str,
    ) -> Result<T, GeocodeError> {
        let response = self
            .client
            .get(url.clone())
            .header(
                reqwest::header::AUTHORIZATION,
                format!("KakaoAK {}", self.api_key),
            )
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());
            tracing::warn!(status = status.as_u16(), context, %message, "geocoding request failed");
            return Err(GeocodeError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| GeocodeError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> GeocodeClient {
        GeocodeClient::with_base_url("test-key", 30, base_url)
            .expect("client construction should not fail")
    }

    #[test]
    fn build_url_appends_path_and_query() {
        let client = test_client("https://dapi.kakao.com");
        let url = client.build_url(KEYWORD_PATH, &[("query", "Seoul Station")]);
        assert_eq!(
            url.as_str(),
            "https://dapi.kakao.com/v2/local/search/keyword.json?query=Seoul+Station"
        );
    }

    #[test]
    fn build_url_strips_trailing_slash() {
        let client = test_client("https://dapi.kakao.com///");
        let url = client.build_url(ADDRESS_PATH, &[("query", "x")]);
        assert!(url
            .as_str()
            .starts_with("https://dapi.kakao.com/v2/local/search/address.json"));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(GeocodeClient::with_base_url("k", 5, "not a url").is_err());
    }
}
