//! HTTP client for the municipal open-data API.
//!
//! Requests take the form `{base}/{key}/json/{service}/{start}/{end}/`
//! with 1-based inclusive row indices.

use std::time::Duration;

use reqwest::{Client, Url};
use safeway_core::{AppConfig, Coordinate};

use crate::error::OpenDataError;
use crate::retry::{with_retries, Backoff};
use crate::types::{row_coordinate, ServicePage, ServiceResult};

const DEFAULT_BASE_URL: &str = "http://openapi.seoul.go.kr:8088/";

/// Dataset names, paging limits, and retry budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenDataSettings {
    pub cctv_service: String,
    pub streetlight_service: String,
    pub page_size: u32,
    pub max_records: u32,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl Default for OpenDataSettings {
    fn default() -> Self {
        Self {
            cctv_service: "safeOpenCCTV".to_owned(),
            streetlight_service: "safeOpenStreetLight".to_owned(),
            page_size: 1000,
            max_records: 200_000,
            max_retries: 2,
            backoff_base_ms: 500,
        }
    }
}

impl OpenDataSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            cctv_service: config.opendata_cctv_service.clone(),
            streetlight_service: config.opendata_streetlight_service.clone(),
            page_size: config.opendata_page_size,
            max_records: config.opendata_max_records,
            max_retries: config.opendata_max_retries,
            backoff_base_ms: config.opendata_retry_backoff_base_ms,
        }
    }
}

/// Client for the open-data API.
///
/// Use [`OpenDataClient::new`] for production or
/// [`OpenDataClient::with_base_url`] to point at a mock server in tests.
pub struct OpenDataClient {
    client: Client,
    api_key: String,
    base_url: Url,
    settings: OpenDataSettings,
}

impl OpenDataClient {
    /// Creates a client pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns [`OpenDataError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        api_key: &str,
        timeout_secs: u64,
        settings: OpenDataSettings,
    ) -> Result<Self, OpenDataError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL, settings)
    }

    /// Creates a client with a custom base URL.
    ///
    /// # Errors
    ///
    /// Returns [`OpenDataError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`OpenDataError::ApiError`] if `base_url` is not a valid URL.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
        settings: OpenDataSettings,
    ) -> Result<Self, OpenDataError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("safeway/0.1 (route-safety)")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| OpenDataError::ApiError {
            code: "CLIENT".to_owned(),
            message: format!("invalid base URL '{base_url}': {e}"),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
            settings,
        })
    }

    /// Builds a client from application config.
    ///
    /// Returns `Ok(None)` when no API key is configured; scoring is then
    /// unavailable rather than silently zero.
    ///
    /// # Errors
    ///
    /// Same as [`OpenDataClient::with_base_url`].
    pub fn from_app_config(config: &AppConfig) -> Result<Option<Self>, OpenDataError> {
        let Some(key) = config.opendata_api_key.as_deref() else {
            return Ok(None);
        };
        Self::with_base_url(
            key,
            config.opendata_request_timeout_secs,
            &config.opendata_base_url,
            OpenDataSettings::from_app_config(config),
        )
        .map(Some)
    }

    #[must_use]
    pub fn settings(&self) -> &OpenDataSettings {
        &self.settings
    }

    /// All CCTV camera positions.
    ///
    /// # Errors
    ///
    /// Returns [`OpenDataError`] once retries are exhausted.
    pub async fn fetch_cctv(&self) -> Result<Vec<Coordinate>, OpenDataError> {
        self.fetch_points(&self.settings.cctv_service).await
    }

    /// All streetlight positions.
    ///
    /// # Errors
    ///
    /// Returns [`OpenDataError`] once retries are exhausted.
    pub async fn fetch_streetlights(&self) -> Result<Vec<Coordinate>, OpenDataError> {
        self.fetch_points(&self.settings.streetlight_service).await
    }

    /// Walks a dataset page by page and collects every row with a usable
    /// coordinate, stopping at the reported total or an empty page.
    ///
    /// # Errors
    ///
    /// Returns the first page error that survives retries, or
    /// [`OpenDataError::Truncated`] when the total exceeds `max_records`.
    pub async fn fetch_points(&self, service: &str) -> Result<Vec<Coordinate>, OpenDataError> {
        let page_size = self.settings.page_size.max(1);
        let max_records = self.settings.max_records;
        let backoff = Backoff::new(self.settings.max_retries, self.settings.backoff_base_ms);
        let mut points = Vec::new();
        let mut skipped = 0usize;
        let mut start = 1u32;

        while start <= max_records {
            let end = start.saturating_add(page_size - 1).min(max_records);
            let page = with_retries(backoff, || self.fetch_page(service, start, end)).await?;

            let rows = page.row.len();
            for row in &page.row {
                match row_coordinate(row) {
                    Some(c) => points.push(c),
                    None => skipped += 1,
                }
            }

            if rows == 0 || end >= page.list_total_count {
                break;
            }
            if end >= max_records {
                tracing::error!(
                    service,
                    total = page.list_total_count,
                    max_records,
                    "dataset exceeds max_records; refusing a partial list"
                );
                return Err(OpenDataError::Truncated {
                    service: service.to_owned(),
                    total: page.list_total_count,
                    max_records,
                });
            }
            start = end + 1;
        }

        tracing::debug!(service, points = points.len(), skipped, "open-data fetch complete");
        Ok(points)
    }

    /// Fetches one page of rows `start..=end`.
    ///
    /// # Errors
    ///
    /// - [`OpenDataError::Http`] on network failure or a non-2xx status.
    /// - [`OpenDataError::ApiError`] for a non-success result code.
    /// - [`OpenDataError::Deserialize`] / [`OpenDataError::MissingService`]
    ///   for unexpected bodies.
    pub async fn fetch_page(
        &self,
        service: &str,
        start: u32,
        end: u32,
    ) -> Result<ServicePage, OpenDataError> {
        let url = self.build_url(service, start, end);
        let response = self.client.get(url).send().await?;
        let response = response.error_for_status()?;
        let body = response.text().await?;
        let context = format!("{service}[{start}..={end}]");
        let value: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| OpenDataError::Deserialize {
                context: context.clone(),
                source: e,
            })?;
        parse_page(service, value, &context)
    }

    fn build_url(&self, service: &str, start: u32, end: u32) -> Url {
        let mut url = self.base_url.clone();
        let start = start.to_string();
        let end = end.to_string();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                self.api_key.as_str(),
                "json",
                service,
                start.as_str(),
                end.as_str(),
                "",
            ]);
        }
        url
    }
}

/// Splits a page body into rows or a typed error.
fn parse_page(
    service: &str,
    mut body: serde_json::Value,
    context: &str,
) -> Result<ServicePage, OpenDataError> {
    if let Some(block) = body.get_mut(service).map(serde_json::Value::take) {
        let page: ServicePage =
            serde_json::from_value(block).map_err(|e| OpenDataError::Deserialize {
                context: context.to_owned(),
                source: e,
            })?;
        return match &page.result {
            Some(result) if result.is_no_data() => Ok(ServicePage::empty()),
            Some(result) if !result.is_ok() => Err(api_error(result)),
            _ => Ok(page),
        };
    }

    // Errors and empty datasets drop the service wrapper.
    let result = body
        .get("RESULT")
        .cloned()
        .map(serde_json::from_value::<ServiceResult>)
        .transpose()
        .map_err(|e| OpenDataError::Deserialize {
            context: context.to_owned(),
            source: e,
        })?;
    match result {
        Some(result) if result.is_no_data() || result.is_ok() => Ok(ServicePage::empty()),
        Some(result) => Err(api_error(&result)),
        None => Err(OpenDataError::MissingService {
            service: service.to_owned(),
        }),
    }
}

fn api_error(result: &ServiceResult) -> OpenDataError {
    OpenDataError::ApiError {
        code: result.code.clone(),
        message: result.message.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> OpenDataClient {
        OpenDataClient::with_base_url("test-key", 30, base_url, OpenDataSettings::default())
            .expect("client construction should not fail")
    }

    #[test]
    fn build_url_uses_path_segments() {
        let client = test_client("http://openapi.seoul.go.kr:8088");
        let url = client.build_url("safeOpenCCTV", 1, 1000);
        assert_eq!(
            url.as_str(),
            "http://openapi.seoul.go.kr:8088/test-key/json/safeOpenCCTV/1/1000/"
        );
    }

    #[test]
    fn build_url_strips_trailing_slash() {
        let client = test_client("http://openapi.seoul.go.kr:8088//");
        let url = client.build_url("svc", 1001, 2000);
        assert_eq!(
            url.as_str(),
            "http://openapi.seoul.go.kr:8088/test-key/json/svc/1001/2000/"
        );
    }

    #[test]
    fn parse_page_reads_wrapped_rows() {
        let body = serde_json::json!({
            "svc": {
                "list_total_count": 2,
                "RESULT": {"CODE": "INFO-000", "MESSAGE": "ok"},
                "row": [{"LAT": "37.5", "LOT": "127.0"}, {"LAT": "37.6", "LOT": "127.1"}]
            }
        });
        let page = parse_page("svc", body, "t").unwrap();
        assert_eq!(page.list_total_count, 2);
        assert_eq!(page.row.len(), 2);
    }

    #[test]
    fn parse_page_treats_no_data_as_empty() {
        let body = serde_json::json!({"RESULT": {"CODE": "INFO-200", "MESSAGE": "none"}});
        let page = parse_page("svc", body, "t").unwrap();
        assert!(page.row.is_empty());
    }

    #[test]
    fn parse_page_surfaces_result_code() {
        let body = serde_json::json!({"RESULT": {"CODE": "INFO-100", "MESSAGE": "bad key"}});
        let err = parse_page("svc", body, "t").unwrap_err();
        assert!(
            matches!(err, OpenDataError::ApiError { ref code, .. } if code == "INFO-100"),
            "got {err:?}"
        );
    }

    #[test]
    fn parse_page_without_block_or_result_is_missing_service() {
        let err = parse_page("svc", serde_json::json!({"other": {}}), "t").unwrap_err();
        assert!(matches!(err, OpenDataError::MissingService { .. }));
    }
}
