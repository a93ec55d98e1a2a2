//! Emergency contacts for the signed-in user.

use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::{AuthUser, RequestId};

use super::{map_db_error, required_text, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct ContactItem {
    id: Uuid,
    name: String,
    phone: String,
    relation: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<safeway_db::ContactRow> for ContactItem {
    fn from(row: safeway_db::ContactRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            phone: row.phone,
            relation: row.relation,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateContactRequest {
    pub name: String,
    pub phone: String,
    pub relation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct DeleteContactRequest {
    pub id: Uuid,
}

/// Digits with optional `+`, spaces, dashes and parentheses; 3-20 digits.
fn validate_phone(rid: &str, phone: &str) -> Result<(), ApiError> {
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'));
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    if allowed && (3..=20).contains(&digits) {
        Ok(())
    } else {
        Err(ApiError::new(
            rid,
            "validation_error",
            format!("'{phone}' is not a valid phone number"),
        ))
    }
}

/// GET /api/contacts
pub(super) async fn list_contacts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<Vec<ContactItem>>>, ApiError> {
    let rows = safeway_db::list_contacts(&state.pool, user.uid)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(
        rows.into_iter().map(ContactItem::from).collect(),
        req_id.0,
    ))
}

/// POST /api/contacts
pub(super) async fn create_contact(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateContactRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ContactItem>>), ApiError> {
    let rid = &req_id.0;
    let name = required_text(rid, "name", &body.name, 50)?;
    let phone = required_text(rid, "phone", &body.phone, 30)?;
    validate_phone(rid, &phone)?;
    let relation = body
        .relation
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty());

    let row = safeway_db::insert_contact(
        &state.pool,
        user.uid,
        &safeway_db::NewContact {
            name: &name,
            phone: &phone,
            relation,
        },
    )
    .await
    .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::new(ContactItem::from(row), req_id.0),
    ))
}

/// POST /api/contacts/delete `{id}`
pub(super) async fn delete_contact(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<DeleteContactRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    safeway_db::delete_contact(&state.pool, user.uid, body.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(
        serde_json::json!({ "deleted": true }),
        req_id.0,
    ))
}
