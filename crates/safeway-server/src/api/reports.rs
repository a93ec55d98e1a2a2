//! Community report board.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use safeway_core::{Coordinate, ReportType};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::{AuthUser, RequestId};

use super::{map_db_error, normalize_limit, required_text, ApiError, ApiResponse, AppState};

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct ReportItem {
    id: Uuid,
    uid: Uuid,
    title: String,
    #[serde(rename = "type")]
    report_type: String,
    content: String,
    location: String,
    lat: Option<f64>,
    lng: Option<f64>,
    likes: i32,
    comment_count: i32,
    created_at: DateTime<Utc>,
}

impl From<safeway_db::ReportRow> for ReportItem {
    fn from(row: safeway_db::ReportRow) -> Self {
        Self {
            id: row.id,
            uid: row.uid,
            title: row.title,
            report_type: row.report_type,
            content: row.content,
            location: row.location,
            lat: row.lat,
            lng: row.lng,
            likes: row.likes,
            comment_count: row.comment_count,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ReportQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateReportRequest {
    pub title: String,
    #[serde(rename = "type")]
    pub report_type: String,
    pub content: String,
    #[serde(default)]
    pub location: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateReportRequest {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub report_type: Option<String>,
    pub content: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct LikeResponse {
    liked: bool,
    likes: i32,
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn parse_report_type(rid: &str, value: &str) -> Result<ReportType, ApiError> {
    value
        .parse::<ReportType>()
        .map_err(|msg| ApiError::new(rid, "validation_error", msg))
}

fn parse_pin(rid: &str, lat: Option<f64>, lng: Option<f64>) -> Result<Option<Coordinate>, ApiError> {
    match (lat, lng) {
        (None, None) => Ok(None),
        (Some(lat), Some(lng)) => {
            let c = Coordinate::new(lat, lng);
            if c.is_valid() {
                Ok(Some(c))
            } else {
                Err(ApiError::new(
                    rid,
                    "validation_error",
                    format!("coordinate {lat},{lng} is out of range"),
                ))
            }
        }
        _ => Err(ApiError::new(
            rid,
            "validation_error",
            "lat and lng must be given together",
        )),
    }
}

/// Loads a report and checks that `user` wrote it.
async fn resolve_owned_report(
    state: &AppState,
    rid: &str,
    id: Uuid,
    user: &AuthUser,
) -> Result<safeway_db::ReportRow, ApiError> {
    let row = safeway_db::get_report(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.to_owned(), &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", format!("report '{id}' not found")))?;
    if row.uid != user.uid {
        return Err(ApiError::new(
            rid,
            "forbidden",
            "only the author can change this report",
        ));
    }
    Ok(row)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/reports: newest first.
pub(super) async fn list_reports(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ApiResponse<Vec<ReportItem>>>, ApiError> {
    let rows = safeway_db::list_reports(&state.pool, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(
        rows.into_iter().map(ReportItem::from).collect(),
        req_id.0,
    ))
}

/// POST /api/reports
pub(super) async fn create_report(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateReportRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ReportItem>>), ApiError> {
    let rid = &req_id.0;
    let title = required_text(rid, "title", &body.title, 100)?;
    let content = required_text(rid, "content", &body.content, 2000)?;
    let report_type = parse_report_type(rid, &body.report_type)?;
    let coordinate = parse_pin(rid, body.lat, body.lng)?;
    let location = body.location.as_deref().map(str::trim).unwrap_or_default();

    let row = safeway_db::insert_report(
        &state.pool,
        user.uid,
        &safeway_db::NewReport {
            title: &title,
            report_type,
            content: &content,
            location,
            coordinate,
        },
    )
    .await
    .map_err(|e| map_db_error(rid.clone(), &e))?;

    tracing::info!(report_id = %row.id, report_type = %report_type, "report created");
    Ok((
        StatusCode::CREATED,
        ApiResponse::new(ReportItem::from(row), req_id.0),
    ))
}

/// GET /api/reports/:id
pub(super) async fn get_report(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ReportItem>>, ApiError> {
    let rid = &req_id.0;
    let row = safeway_db::get_report(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", format!("report '{id}' not found")))?;

    Ok(ApiResponse::new(ReportItem::from(row), req_id.0))
}

/// PUT /api/reports/:id: author only.
pub(super) async fn update_report(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateReportRequest>,
) -> Result<Json<ApiResponse<ReportItem>>, ApiError> {
    let rid = &req_id.0;
    resolve_owned_report(&state, rid, id, &user).await?;

    let update = safeway_db::ReportUpdate {
        title: body
            .title
            .as_deref()
            .map(|t| required_text(rid, "title", t, 100))
            .transpose()?,
        report_type: body
            .report_type
            .as_deref()
            .map(|t| parse_report_type(rid, t))
            .transpose()?,
        content: body
            .content
            .as_deref()
            .map(|c| required_text(rid, "content", c, 2000))
            .transpose()?,
        location: body.location.map(|l| l.trim().to_owned()),
    };

    let row = safeway_db::update_report(&state.pool, id, &update)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(ApiResponse::new(ReportItem::from(row), req_id.0))
}

/// DELETE /api/reports/:id: author only.
pub(super) async fn delete_report(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let rid = &req_id.0;
    resolve_owned_report(&state, rid, id, &user).await?;

    safeway_db::delete_report(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(ApiResponse::new(
        serde_json::json!({ "deleted": true }),
        req_id.0,
    ))
}

/// POST /api/reports/:id/like: toggles the caller's like.
pub(super) async fn toggle_like(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<LikeResponse>>, ApiError> {
    let toggle = safeway_db::toggle_like(&state.pool, id, user.uid)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(
        LikeResponse {
            liked: toggle.liked,
            likes: toggle.likes,
        },
        req_id.0,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_requires_both_axes_in_range() {
        assert_eq!(parse_pin("r", None, None).unwrap(), None);
        assert_eq!(
            parse_pin("r", Some(37.5), Some(127.0)).unwrap(),
            Some(Coordinate::new(37.5, 127.0))
        );
        assert!(parse_pin("r", Some(37.5), None).is_err());
        assert!(parse_pin("r", Some(91.0), Some(127.0)).is_err());
    }

    #[test]
    fn unknown_report_type_is_validation_error() {
        let err = parse_report_type("r", "spooky").unwrap_err();
        assert_eq!(err.error.code, "validation_error");
        assert_eq!(parse_report_type("r", "danger").unwrap(), ReportType::Danger);
    }
}
