use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::{AuthUser, RequestId};

use super::{double_option, map_db_error, required_text, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct UserItem {
    uid: Uuid,
    email: String,
    name: String,
    phone: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<safeway_db::UserRow> for UserItem {
    fn from(row: safeway_db::UserRow) -> Self {
        Self {
            uid: row.uid,
            email: row.email,
            name: row.name,
            phone: row.phone,
            created_at: row.created_at,
        }
    }
}

// Outer None = field absent (keep), Some(None) = explicit null (clear).
#[allow(clippy::option_option)]
#[derive(Debug, Deserialize)]
pub(super) struct UpdateUserRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
}

fn ensure_self(rid: &str, user: &AuthUser, uid: Uuid) -> Result<(), ApiError> {
    if user.uid == uid {
        Ok(())
    } else {
        Err(ApiError::new(
            rid,
            "forbidden",
            "profiles can only be accessed by their owner",
        ))
    }
}

/// GET /api/users/:uid
pub(super) async fn get_user(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<AuthUser>,
    Path(uid): Path<Uuid>,
) -> Result<Json<ApiResponse<UserItem>>, ApiError> {
    let rid = &req_id.0;
    ensure_self(rid, &user, uid)?;

    let row = safeway_db::get_user(&state.pool, uid)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", format!("user '{uid}' not found")))?;

    Ok(ApiResponse::new(UserItem::from(row), req_id.0))
}

/// PUT /api/users/:uid: sparse profile update; self only.
pub(super) async fn update_user(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<AuthUser>,
    Path(uid): Path<Uuid>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserItem>>, ApiError> {
    let rid = &req_id.0;
    ensure_self(rid, &user, uid)?;

    let name = body
        .name
        .as_deref()
        .map(|n| required_text(rid, "name", n, 50))
        .transpose()?;
    let phone = body.phone.map(|p| {
        p.map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
    });

    let row = safeway_db::update_user(&state.pool, uid, &safeway_db::UserUpdate { name, phone })
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", format!("user '{uid}' not found")))?;

    Ok(ApiResponse::new(UserItem::from(row), req_id.0))
}
