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
pub(super) struct CommentItem {
    id: Uuid,
    report_id: Uuid,
    uid: Uuid,
    author_name: String,
    content: String,
    created_at: DateTime<Utc>,
}

impl From<safeway_db::CommentRow> for CommentItem {
    fn from(row: safeway_db::CommentRow) -> Self {
        Self {
            id: row.id,
            report_id: row.report_id,
            uid: row.uid,
            author_name: row.author_name,
            content: row.content,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateCommentRequest {
    pub content: String,
}

/// GET /api/reports/:id/comments: oldest first; 404 for an unknown report.
pub(super) async fn list_comments(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(report_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<CommentItem>>>, ApiError> {
    let rid = &req_id.0;
    let exists = safeway_db::get_report(&state.pool, report_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .is_some();
    if !exists {
        return Err(ApiError::new(
            rid,
            "not_found",
            format!("report '{report_id}' not found"),
        ));
    }

    let rows = safeway_db::list_comments(&state.pool, report_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(ApiResponse::new(
        rows.into_iter().map(CommentItem::from).collect(),
        req_id.0,
    ))
}

/// POST /api/reports/:id/comments
pub(super) async fn create_comment(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<AuthUser>,
    Path(report_id): Path<Uuid>,
    Json(body): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CommentItem>>), ApiError> {
    let rid = &req_id.0;
    let content = required_text(rid, "content", &body.content, 500)?;

    let row = safeway_db::insert_comment(
        &state.pool,
        &safeway_db::NewComment {
            report_id,
            uid: user.uid,
            author_name: &user.name,
            content: &content,
        },
    )
    .await
    .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::new(CommentItem::from(row), req_id.0),
    ))
}
