use thiserror::Error;

/// Errors surfaced by [`ApiClient`](crate::ApiClient) calls.
///
/// Variants line up with what a screen shows: a credentials message, a
/// sign-in prompt, a connection toast, or an inline field error.
#[derive(Debug, Error)]
pub enum ClientError {
    /// 401 from the login endpoint.
    #[error("wrong email or password")]
    WrongCredentials,

    /// 401 from any other endpoint, or no session at all.
    #[error("not signed in or session expired")]
    Unauthorized,

    /// Request never got a response.
    #[error("could not reach the server: {0}")]
    ConnectionFailed(#[source] reqwest::Error),

    /// Rejected locally before anything was sent.
    #[error("{0}")]
    Validation(String),

    /// 503 from route scoring.
    #[error("route safety scoring is unavailable")]
    ScoringUnavailable,

    /// Any other error envelope from the server.
    #[error("API error ({status}) {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// The response body did not match the expected shape.
    #[error("could not decode response for {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Geocode(#[from] safeway_geocode::GeocodeError),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        Self::ConnectionFailed(e)
    }
}
