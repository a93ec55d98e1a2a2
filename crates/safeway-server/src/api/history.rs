//! Completed-navigation history, scoped to the caller.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::{AuthUser, RequestId};

use super::{map_db_error, required_text, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct HistoryItem {
    id: Uuid,
    start_label: String,
    end_label: String,
    score: i32,
    distance: String,
    time: String,
    created_at: DateTime<Utc>,
}

impl From<safeway_db::HistoryRow> for HistoryItem {
    fn from(row: safeway_db::HistoryRow) -> Self {
        Self {
            id: row.id,
            start_label: row.start_label,
            end_label: row.end_label,
            score: row.score,
            distance: row.distance,
            time: row.time,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateHistoryRequest {
    pub start_label: String,
    pub end_label: String,
    pub score: i32,
    pub distance: String,
    pub time: String,
}

#[derive(Debug, Serialize)]
pub(super) struct ClearedHistory {
    cleared: u64,
}

/// GET /api/history: newest first.
pub(super) async fn list_history(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<Vec<HistoryItem>>>, ApiError> {
    let rows = safeway_db::list_history(&state.pool, user.uid)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(
        rows.into_iter().map(HistoryItem::from).collect(),
        req_id.0,
    ))
}

/// POST /api/history
pub(super) async fn create_history(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateHistoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<HistoryItem>>), ApiError> {
    let rid = &req_id.0;
    if !(0..=100).contains(&body.score) {
        return Err(ApiError::new(
            rid,
            "validation_error",
            format!("score must be 0-100, got {}", body.score),
        ));
    }
    let start = required_text(rid, "start_label", &body.start_label, 200)?;
    let end = required_text(rid, "end_label", &body.end_label, 200)?;
    let distance = required_text(rid, "distance", &body.distance, 32)?;
    let time = required_text(rid, "time", &body.time, 32)?;

    let row = safeway_db::insert_history(
        &state.pool,
        user.uid,
        &safeway_db::NewHistoryEntry {
            start_label: &start,
            end_label: &end,
            score: body.score,
            distance: &distance,
            time: &time,
        },
    )
    .await
    .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::new(HistoryItem::from(row), req_id.0),
    ))
}

/// DELETE /api/history
pub(super) async fn clear_history(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<ClearedHistory>>, ApiError> {
    let cleared = safeway_db::clear_history(&state.pool, user.uid)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(ClearedHistory { cleared }, req_id.0))
}

/// DELETE /api/history/:id
pub(super) async fn delete_history_entry(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    safeway_db::delete_history_entry(&state.pool, user.uid, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(
        serde_json::json!({ "deleted": true }),
        req_id.0,
    ))
}
