use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::{map_db_error, ApiError, AppState};

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// The account behind the bearer token, stored as a request extension by
/// [`require_session_auth`].
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub uid: Uuid,
    pub name: String,
    pub token: String,
}

#[derive(Debug, Clone)]
struct RateLimitWindow {
    started_at: Instant,
    count: usize,
}

/// Fixed-window limiter keyed by the authenticated account, so each user
/// gets an independent quota on the protected routes.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    windows: Arc<Mutex<HashMap<Uuid, RateLimitWindow>>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    #[must_use]
    pub fn per_minute(max_requests: usize) -> Self {
        Self::new(max_requests, Duration::from_secs(60))
    }

    /// Counts one request for `uid`; `false` once its window is full.
    async fn admit(&self, uid: Uuid) -> bool {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        // Expired windows carry no state worth keeping.
        windows.retain(|_, w| now.duration_since(w.started_at) < self.window);

        let window = windows.entry(uid).or_insert(RateLimitWindow {
            started_at: now,
            count: 0,
        });
        if window.count >= self.max_requests {
            return false;
        }
        window.count += 1;
        true
    }
}

fn request_id_of(req: &Request) -> String {
    req.extensions()
        .get::<RequestId>()
        .map(|r| r.0.clone())
        .unwrap_or_default()
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware resolving the bearer token to a live session.
///
/// On success an [`AuthUser`] is inserted into request extensions. Missing,
/// unknown, and expired tokens all get `401 unauthorized`.
pub async fn require_session_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let rid = request_id_of(&req);
    let Some(token) = extract_bearer_token(req.headers().get(AUTHORIZATION)).map(str::to_owned)
    else {
        return ApiError::new(rid, "unauthorized", "missing bearer token").into_response();
    };

    match safeway_db::find_session_user(&state.pool, &token).await {
        Ok(Some(session)) => {
            req.extensions_mut().insert(AuthUser {
                uid: session.uid,
                name: session.name,
                token,
            });
            next.run(req).await
        }
        Ok(None) => {
            tracing::debug!(request_id = %rid, "rejected unknown or expired session token");
            ApiError::new(rid, "unauthorized", "invalid or expired session").into_response()
        }
        Err(e) => map_db_error(rid, &e).into_response(),
    }
}

/// Middleware enforcing a fixed request-per-window limit per account.
///
/// Must run inside [`require_session_auth`]; a request without an
/// [`AuthUser`] is rejected as unauthorized rather than counted.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let Some(uid) = req.extensions().get::<AuthUser>().map(|u| u.uid) else {
        return ApiError::new(request_id_of(&req), "unauthorized", "missing session")
            .into_response();
    };

    if !rate_limit.admit(uid).await {
        tracing::warn!(%uid, max_requests = rate_limit.max_requests, "rate limit exceeded");
        return ApiError::new(request_id_of(&req), "rate_limited", "rate limit exceeded")
            .into_response();
    }

    next.run(req).await
}

pub(crate) fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn quotas_are_tracked_per_account() {
        let limiter = RateLimitState::per_minute(2);
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        assert!(limiter.admit(a).await);
        assert!(limiter.admit(a).await);
        assert!(!limiter.admit(a).await);
        assert!(limiter.admit(b).await);
    }

    #[tokio::test]
    async fn expired_windows_reset_and_are_pruned() {
        let limiter = RateLimitState::new(1, Duration::ZERO);
        let uid = Uuid::new_v4();

        assert!(limiter.admit(uid).await);
        assert!(limiter.admit(uid).await);
        limiter.admit(Uuid::new_v4()).await;
        assert_eq!(limiter.windows.lock().await.len(), 1);
    }

    #[test]
    fn extract_bearer_token_accepts_valid_header() {
        let header = HeaderValue::from_static("Bearer test-token");
        assert_eq!(extract_bearer_token(Some(&header)), Some("test-token"));
    }

    #[test]
    fn extract_bearer_token_rejects_non_bearer_header() {
        let header = HeaderValue::from_static("Basic abc123");
        assert_eq!(extract_bearer_token(Some(&header)), None);
    }

    #[test]
    fn extract_bearer_token_rejects_blank_token() {
        let header = HeaderValue::from_static("Bearer   ");
        assert_eq!(extract_bearer_token(Some(&header)), None);
        assert_eq!(extract_bearer_token(None), None);
    }
}
