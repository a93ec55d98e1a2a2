//! Typed client for the SafeWay HTTP API.
//!
//! Every call unwraps the `{data, meta}` envelope and maps error envelopes
//! onto [`ClientError`]. There are no automatic retries; a failed call is
//! reported once and the caller decides what to show.

use std::time::Duration;

use reqwest::{Client, Method, StatusCode, Url};
use safeway_core::Coordinate;
use safeway_route::SafetyAssessment;
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::error::ClientError;
use crate::session::Session;
use crate::types::{
    AuthPayload, Comment, EmergencyContact, Envelope, ErrorEnvelope, HistoryEntry, LikeState,
    NewHistoryEntry, NewReport, Report, UserProfile,
};

/// What a 401 means depends on the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    Login,
    Scoring,
    Other,
}

pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// # Errors
    ///
    /// Returns [`ClientError::ConnectionFailed`] if the `reqwest::Client`
    /// cannot be built, or [`ClientError::Validation`] for a malformed URL.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("safeway-client/0.1")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| ClientError::Validation(format!("invalid base URL '{base_url}': {e}")))?;

        Ok(Self { client, base_url })
    }

    // -- auth ---------------------------------------------------------------

    /// # Errors
    ///
    /// [`ClientError::Validation`] for blank fields; otherwise the server's
    /// verdict (e.g. `Api { status: 409, .. }` for a taken email).
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
        phone: Option<&str>,
    ) -> Result<AuthPayload, ClientError> {
        require("email", email)?;
        require("password", password)?;
        require("name", name)?;
        let body = serde_json::json!({
            "email": email.trim(),
            "password": password,
            "name": name.trim(),
            "phone": phone,
        });
        self.send(Method::POST, "api/auth/register", None, Some(&body), Endpoint::Other)
            .await
    }

    /// # Errors
    ///
    /// [`ClientError::WrongCredentials`] on a 401.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthPayload, ClientError> {
        require("email", email)?;
        require("password", password)?;
        let body = serde_json::json!({ "email": email.trim(), "password": password });
        self.send(Method::POST, "api/auth/login", None, Some(&body), Endpoint::Login)
            .await
    }

    /// Revokes the session server-side. The caller still transitions its
    /// [`Session`] with [`Session::logout`].
    ///
    /// # Errors
    ///
    /// Same as any authenticated call.
    pub async fn logout(&self, session: &Session) -> Result<(), ClientError> {
        let _: serde_json::Value = self
            .authed(Method::POST, "api/auth/logout", session, None::<&()>)
            .await?;
        Ok(())
    }

    // -- profile ------------------------------------------------------------

    /// # Errors
    ///
    /// [`ClientError::Unauthorized`] without a session.
    pub async fn get_profile(&self, session: &Session) -> Result<UserProfile, ClientError> {
        let uid = session_uid(session)?;
        self.authed(Method::GET, &format!("api/users/{uid}"), session, None::<&()>)
            .await
    }

    /// `phone: Some(None)` clears the number.
    ///
    /// # Errors
    ///
    /// [`ClientError::Unauthorized`] without a session.
    #[allow(clippy::option_option)]
    pub async fn update_profile(
        &self,
        session: &Session,
        name: Option<&str>,
        phone: Option<Option<&str>>,
    ) -> Result<UserProfile, ClientError> {
        let uid = session_uid(session)?;
        let mut body = serde_json::Map::new();
        if let Some(name) = name {
            require("name", name)?;
            body.insert("name".to_owned(), name.trim().into());
        }
        if let Some(phone) = phone {
            body.insert("phone".to_owned(), phone.into());
        }
        self.authed(Method::PUT, &format!("api/users/{uid}"), session, Some(&body))
            .await
    }

    // -- contacts -----------------------------------------------------------

    /// # Errors
    ///
    /// [`ClientError::Unauthorized`] without a session.
    pub async fn list_contacts(
        &self,
        session: &Session,
    ) -> Result<Vec<EmergencyContact>, ClientError> {
        self.authed(Method::GET, "api/contacts", session, None::<&()>)
            .await
    }

    /// # Errors
    ///
    /// [`ClientError::Validation`] for a blank name or phone.
    pub async fn add_contact(
        &self,
        session: &Session,
        name: &str,
        phone: &str,
        relation: Option<&str>,
    ) -> Result<EmergencyContact, ClientError> {
        require("name", name)?;
        require("phone", phone)?;
        let body = serde_json::json!({ "name": name, "phone": phone, "relation": relation });
        self.authed(Method::POST, "api/contacts", session, Some(&body))
            .await
    }

    /// # Errors
    ///
    /// `Api { status: 404, .. }` if the contact is gone.
    pub async fn delete_contact(&self, session: &Session, id: Uuid) -> Result<(), ClientError> {
        let body = serde_json::json!({ "id": id });
        let _: serde_json::Value = self
            .authed(Method::POST, "api/contacts/delete", session, Some(&body))
            .await?;
        Ok(())
    }

    // -- reports ------------------------------------------------------------

    /// # Errors
    ///
    /// [`ClientError::Unauthorized`] without a session.
    pub async fn list_reports(&self, session: &Session) -> Result<Vec<Report>, ClientError> {
        self.authed(Method::GET, "api/reports", session, None::<&()>)
            .await
    }

    /// # Errors
    ///
    /// `Api { status: 404, .. }` for an unknown report.
    pub async fn get_report(&self, session: &Session, id: Uuid) -> Result<Report, ClientError> {
        self.authed(Method::GET, &format!("api/reports/{id}"), session, None::<&()>)
            .await
    }

    /// # Errors
    ///
    /// [`ClientError::Validation`] for a blank title or content.
    pub async fn create_report(
        &self,
        session: &Session,
        report: &NewReport,
    ) -> Result<Report, ClientError> {
        require("title", &report.title)?;
        require("content", &report.content)?;
        self.authed(Method::POST, "api/reports", session, Some(report))
            .await
    }

    /// # Errors
    ///
    /// `Api { status: 403, .. }` when the caller is not the author.
    pub async fn delete_report(&self, session: &Session, id: Uuid) -> Result<(), ClientError> {
        let _: serde_json::Value = self
            .authed(Method::DELETE, &format!("api/reports/{id}"), session, None::<&()>)
            .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// `Api { status: 404, .. }` for an unknown report.
    pub async fn toggle_like(&self, session: &Session, id: Uuid) -> Result<LikeState, ClientError> {
        self.authed(
            Method::POST,
            &format!("api/reports/{id}/like"),
            session,
            None::<&()>,
        )
        .await
    }

    /// # Errors
    ///
    /// `Api { status: 404, .. }` for an unknown report.
    pub async fn list_comments(
        &self,
        session: &Session,
        report_id: Uuid,
    ) -> Result<Vec<Comment>, ClientError> {
        self.authed(
            Method::GET,
            &format!("api/reports/{report_id}/comments"),
            session,
            None::<&()>,
        )
        .await
    }

    /// # Errors
    ///
    /// [`ClientError::Validation`] for blank content.
    pub async fn add_comment(
        &self,
        session: &Session,
        report_id: Uuid,
        content: &str,
    ) -> Result<Comment, ClientError> {
        require("content", content)?;
        let body = serde_json::json!({ "content": content });
        self.authed(
            Method::POST,
            &format!("api/reports/{report_id}/comments"),
            session,
            Some(&body),
        )
        .await
    }

    // -- history ------------------------------------------------------------

    /// # Errors
    ///
    /// [`ClientError::Unauthorized`] without a session.
    pub async fn list_history(&self, session: &Session) -> Result<Vec<HistoryEntry>, ClientError> {
        self.authed(Method::GET, "api/history", session, None::<&()>)
            .await
    }

    /// # Errors
    ///
    /// [`ClientError::Unauthorized`] without a session.
    pub async fn add_history(
        &self,
        session: &Session,
        entry: &NewHistoryEntry,
    ) -> Result<HistoryEntry, ClientError> {
        self.authed(Method::POST, "api/history", session, Some(entry))
            .await
    }

    /// # Errors
    ///
    /// `Api { status: 404, .. }` if the entry is gone.
    pub async fn delete_history_entry(
        &self,
        session: &Session,
        id: Uuid,
    ) -> Result<(), ClientError> {
        let _: serde_json::Value = self
            .authed(Method::DELETE, &format!("api/history/{id}"), session, None::<&()>)
            .await?;
        Ok(())
    }

    /// Returns how many entries were removed.
    ///
    /// # Errors
    ///
    /// [`ClientError::Unauthorized`] without a session.
    pub async fn clear_history(&self, session: &Session) -> Result<u64, ClientError> {
        let cleared: serde_json::Value = self
            .authed(Method::DELETE, "api/history", session, None::<&()>)
            .await?;
        Ok(cleared
            .get("cleared")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0))
    }

    // -- scoring ------------------------------------------------------------

    /// `POST /api/route/safety`.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Validation`] for an empty path.
    /// - [`ClientError::ScoringUnavailable`] on a 503.
    pub async fn score_route(
        &self,
        session: &Session,
        path: &[Coordinate],
    ) -> Result<SafetyAssessment, ClientError> {
        if path.is_empty() {
            return Err(ClientError::Validation("path has no points".to_owned()));
        }
        let token = session.token().ok_or(ClientError::Unauthorized)?;
        let body = serde_json::json!({ "pathPoints": path });
        self.send(
            Method::POST,
            "api/route/safety",
            Some(token),
            Some(&body),
            Endpoint::Scoring,
        )
        .await
    }

    // -- plumbing -----------------------------------------------------------

    async fn authed<B, T>(
        &self,
        method: Method,
        path: &str,
        session: &Session,
        body: Option<&B>,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let token = session.token().ok_or(ClientError::Unauthorized)?;
        self.send(method, path, Some(token), body, Endpoint::Other)
            .await
    }

    async fn send<B, T>(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<&B>,
        endpoint: Endpoint,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| ClientError::Validation(format!("invalid path '{path}': {e}")))?;

        let mut request = self.client.request(method, url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            return Err(map_error(status, &bytes, endpoint));
        }

        let envelope: Envelope<T> =
            serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode {
                context: path.to_owned(),
                source: e,
            })?;
        Ok(envelope.data)
    }
}

fn require(field: &str, value: &str) -> Result<(), ClientError> {
    if value.trim().is_empty() {
        Err(ClientError::Validation(format!("{field} is required")))
    } else {
        Ok(())
    }
}

fn session_uid(session: &Session) -> Result<Uuid, ClientError> {
    session
        .user()
        .map(|u| u.uid)
        .ok_or(ClientError::Unauthorized)
}

fn map_error(status: StatusCode, body: &[u8], endpoint: Endpoint) -> ClientError {
    match (status, endpoint) {
        (StatusCode::UNAUTHORIZED, Endpoint::Login) => return ClientError::WrongCredentials,
        (StatusCode::UNAUTHORIZED, _) => return ClientError::Unauthorized,
        (StatusCode::SERVICE_UNAVAILABLE, Endpoint::Scoring) => {
            return ClientError::ScoringUnavailable
        }
        _ => {}
    }

    let (code, message) = serde_json::from_slice::<ErrorEnvelope>(body).map_or_else(
        |_| {
            (
                "unknown".to_owned(),
                status.canonical_reason().unwrap_or("unknown").to_owned(),
            )
        },
        |e| (e.error.code, e.error.message),
    );
    tracing::debug!(status = status.as_u16(), %code, "api call failed");
    ClientError::Api {
        status: status.as_u16(),
        code,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_401_is_wrong_credentials_elsewhere_unauthorized() {
        assert!(matches!(
            map_error(StatusCode::UNAUTHORIZED, b"", Endpoint::Login),
            ClientError::WrongCredentials
        ));
        assert!(matches!(
            map_error(StatusCode::UNAUTHORIZED, b"", Endpoint::Other),
            ClientError::Unauthorized
        ));
    }

    #[test]
    fn scoring_503_is_unavailable() {
        assert!(matches!(
            map_error(StatusCode::SERVICE_UNAVAILABLE, b"", Endpoint::Scoring),
            ClientError::ScoringUnavailable
        ));
    }

    #[test]
    fn error_envelope_is_decoded() {
        let body = br#"{"error": {"code": "conflict", "message": "email already exists"}, "meta": {}}"#;
        match map_error(StatusCode::CONFLICT, body, Endpoint::Other) {
            ClientError::Api {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 409);
                assert_eq!(code, "conflict");
                assert_eq!(message, "email already exists");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn non_json_error_falls_back_to_reason() {
        match map_error(StatusCode::BAD_GATEWAY, b"<html>", Endpoint::Other) {
            ClientError::Api { code, message, .. } => {
                assert_eq!(code, "unknown");
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
