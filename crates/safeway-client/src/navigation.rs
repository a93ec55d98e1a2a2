//! Navigation flow: record the chosen route, then track the walk.

use safeway_core::Coordinate;
use safeway_route::{
    run_navigation, LocationProvider, NavError, NavigationTracker, Progress, RouteMetrics,
    TrackerState,
};
use tokio::sync::oneshot;

use crate::api::ApiClient;
use crate::session::Session;
use crate::types::NewHistoryEntry;

#[derive(Debug, Clone)]
pub struct NavigationRequest<'a> {
    pub start_label: &'a str,
    pub end_label: &'a str,
    pub path: Vec<Coordinate>,
    pub metrics: &'a RouteMetrics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationOutcome {
    pub final_state: TrackerState,
    pub history_saved: bool,
}

/// Writes a history entry for the chosen route and runs the tracker until
/// arrival, cancellation, or the location stream ends.
///
/// A failed history write is logged and does not stop navigation.
///
/// # Errors
///
/// Returns [`NavError`] if the path cannot be tracked (fewer than two
/// points or an invalid coordinate); nothing is written in that case.
pub async fn start_navigation<P, F>(
    api: &ApiClient,
    session: &Session,
    request: NavigationRequest<'_>,
    provider: &P,
    cancel: oneshot::Receiver<()>,
    on_progress: F,
) -> Result<NavigationOutcome, NavError>
where
    P: LocationProvider + ?Sized,
    F: FnMut(&Progress),
{
    let metrics = request.metrics;
    let mut tracker = NavigationTracker::new(request.path, metrics.estimated_minutes)?;

    let entry = NewHistoryEntry {
        start_label: request.start_label.to_owned(),
        end_label: request.end_label.to_owned(),
        score: i32::try_from(metrics.score).unwrap_or(100),
        distance: metrics.distance_label.clone(),
        time: metrics.time_label.clone(),
    };
    let history_saved = match api.add_history(session, &entry).await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(error = %e, "history write failed; continuing navigation");
            false
        }
    };

    let final_state = run_navigation(&mut tracker, provider, cancel, on_progress).await;
    tracing::info!(state = ?final_state, "navigation finished");

    Ok(NavigationOutcome {
        final_state,
        history_saved,
    })
}
