//! Account registration, login and logout.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::{AuthUser, RequestId};
use crate::password::{
    hash_password, is_acceptable_password, is_valid_email, verify_password, MIN_PASSWORD_LEN,
};

use super::{map_db_error, required_text, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub(super) struct AuthResponse {
    pub uid: Uuid,
    pub token: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub(super) struct LogoutResponse {
    pub logged_out: bool,
}

async fn issue_session(state: &AppState, uid: Uuid, rid: &str) -> Result<String, ApiError> {
    let token = Uuid::new_v4().simple().to_string();
    let expires_at = Utc::now() + state.auth.session_ttl;
    safeway_db::create_session(&state.pool, &token, uid, expires_at)
        .await
        .map_err(|e| map_db_error(rid.to_owned(), &e))?;
    Ok(token)
}

/// Runs password hashing on the blocking pool.
async fn off_executor<T, F>(rid: &str, work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|e| {
        tracing::error!(request_id = %rid, error = %e, "password task failed");
        ApiError::new(rid, "internal_error", "password check failed")
    })
}

/// POST /api/auth/register
pub(super) async fn register(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), ApiError> {
    let rid = &req_id.0;

    let email = body.email.trim();
    if !is_valid_email(email) {
        return Err(ApiError::new(rid, "validation_error", "email is not valid"));
    }
    if !is_acceptable_password(&body.password) {
        return Err(ApiError::new(
            rid,
            "validation_error",
            format!("password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    let name = required_text(rid, "name", &body.name, 50)?;
    let phone = body
        .phone
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty());

    let auth = Arc::clone(&state.auth);
    let password = body.password;
    let digest = off_executor(rid, move || hash_password(&password, &auth.password_pepper))
        .await?
        .map_err(|e| {
            tracing::error!(error = %e, "password hashing failed");
            ApiError::new(rid, "internal_error", "could not register account")
        })?;
    let user = safeway_db::create_user(
        &state.pool,
        &safeway_db::NewUser {
            email,
            name: &name,
            phone,
            password_hash: &digest,
        },
    )
    .await
    .map_err(|e| map_db_error(rid.clone(), &e))?;

    let token = issue_session(&state, user.uid, rid).await?;
    tracing::info!(uid = %user.uid, "account registered");

    Ok((
        StatusCode::CREATED,
        ApiResponse::new(
            AuthResponse {
                uid: user.uid,
                token,
                name: user.name,
            },
            req_id.0,
        ),
    ))
}

/// POST /api/auth/login
pub(super) async fn login(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    let rid = &req_id.0;
    let invalid = || ApiError::new(rid, "invalid_credentials", "email or password is incorrect");

    let email = body.email.trim();
    if email.is_empty() || body.password.is_empty() {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "email and password are required",
        ));
    }

    let creds = safeway_db::get_credentials_by_email(&state.pool, email)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(invalid)?;

    let auth = Arc::clone(&state.auth);
    let password = body.password;
    let stored = creds.password_hash.clone();
    let verified =
        off_executor(rid, move || verify_password(&password, &auth.password_pepper, &stored))
            .await?;
    if !verified {
        tracing::info!(uid = %creds.uid, "login rejected: wrong password");
        return Err(invalid());
    }

    let token = issue_session(&state, creds.uid, rid).await?;

    Ok(ApiResponse::new(
        AuthResponse {
            uid: creds.uid,
            token,
            name: creds.name,
        },
        req_id.0,
    ))
}

/// POST /api/auth/logout: revokes the presented token.
pub(super) async fn logout(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<LogoutResponse>>, ApiError> {
    let removed = safeway_db::delete_session(&state.pool, &user.token)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(
        LogoutResponse {
            logged_out: removed,
        },
        req_id.0,
    ))
}
