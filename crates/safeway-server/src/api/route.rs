//! Route safety scoring.
//!
//! Counts CCTV cameras, streetlights and pinned community reports near a
//! walking path and hands the counts to the configured [`ScoringPolicy`].
//! Camera and streetlight positions come from the shared infrastructure
//! cache; reports are read from the database per request.
//!
//! [`ScoringPolicy`]: safeway_route::ScoringPolicy

use axum::{extract::State, Extension, Json};
use safeway_core::Coordinate;
use safeway_route::{count_near_path, path_bounds, InfrastructureCounts, SafetyAssessment};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState};

pub(super) const MAX_PATH_POINTS: usize = 2000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SafetyRequest {
    #[serde(default)]
    pub path_points: Vec<Coordinate>,
}

fn validate_path(rid: &str, path: &[Coordinate]) -> Result<(), ApiError> {
    if path.is_empty() || path.len() > MAX_PATH_POINTS {
        return Err(ApiError::new(
            rid,
            "validation_error",
            format!(
                "pathPoints must contain 1-{MAX_PATH_POINTS} points, got {}",
                path.len()
            ),
        ));
    }
    if let Some(index) = path.iter().position(|c| !c.is_valid()) {
        return Err(ApiError::new(
            rid,
            "validation_error",
            format!("pathPoints[{index}] is not a valid coordinate"),
        ));
    }
    Ok(())
}

fn unavailable(rid: &str) -> ApiError {
    ApiError::new(
        rid,
        "scoring_unavailable",
        "safety data is temporarily unavailable",
    )
}

/// POST /api/route/safety
pub(super) async fn route_safety(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<SafetyRequest>,
) -> Result<Json<ApiResponse<SafetyAssessment>>, ApiError> {
    let rid = req_id.0.as_str();
    let path = body.path_points;
    validate_path(rid, &path)?;

    let Some(cache) = state.opendata.as_deref() else {
        tracing::warn!(request_id = %rid, "route scoring requested without an open-data key");
        return Err(unavailable(rid));
    };

    let radius = state.policy.radius_meters();

    let infrastructure = async {
        cache.snapshot().await.map_err(|e| {
            tracing::error!(request_id = %rid, error = %e, "infrastructure data unavailable");
            unavailable(rid)
        })
    };
    let reports = async {
        let Some((south_west, north_east)) = path_bounds(&path, radius) else {
            return Ok(Vec::new());
        };
        safeway_db::list_report_coordinates_within(&state.pool, south_west, north_east)
            .await
            .map_err(|e| {
                tracing::error!(request_id = %rid, error = %e, "report lookup failed");
                unavailable(rid)
            })
    };

    let (snapshot, reports) = tokio::try_join!(infrastructure, reports)?;

    let counts = InfrastructureCounts {
        cctv: count_near_path(&path, &snapshot.cctv, radius),
        lights: count_near_path(&path, &snapshot.streetlights, radius),
        reports: count_near_path(&path, &reports, radius),
    };
    let assessment = state.policy.assess(counts);

    tracing::info!(
        request_id = %rid,
        points = path.len(),
        cctv = counts.cctv,
        lights = counts.lights,
        reports = counts.reports,
        score = assessment.safety_score,
        "route scored"
    );

    Ok(ApiResponse::new(assessment, req_id.0.clone()))
}
