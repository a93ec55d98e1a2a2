use thiserror::Error;

/// Errors returned by the open-data API client.
#[derive(Debug, Error)]
pub enum OpenDataError {
    /// Network or TLS failure, or a non-2xx HTTP status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success `RESULT.CODE`.
    #[error("open-data API error {code}: {message}")]
    ApiError { code: String, message: String },

    /// The dataset holds more rows than `max_records` lets us read, so any
    /// count taken from it would be incomplete.
    #[error("{service} holds {total} rows, more than the configured limit of {max_records}")]
    Truncated {
        service: String,
        total: u32,
        max_records: u32,
    },

    /// The body carried neither the requested service block nor a `RESULT`.
    #[error("response has no '{service}' block")]
    MissingService { service: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}
