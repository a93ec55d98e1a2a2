//! Live navigation tracker.
//!
//! ```text
//! Idle ──start──▶ Tracking ──within 30 m──▶ Arrived
//!   │                 │
//!   └──cancel─────────┴──cancel / permission denied──▶ Cancelled
//! ```
//!
//! `Arrived` and `Cancelled` are terminal; a new session needs a new tracker.

use safeway_core::Coordinate;
use serde::Serialize;

use crate::geo::haversine_meters;
use crate::matching::{nearest_point_index, remaining_minutes, split_path, EtaLabel};
use crate::NavError;

/// Distance to the destination below which the user has arrived.
pub const ARRIVAL_THRESHOLD_METERS: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerState {
    Idle,
    Tracking,
    Arrived,
    Cancelled,
}

impl TrackerState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, TrackerState::Arrived | TrackerState::Cancelled)
    }
}

/// Errors reported by the device location service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeoError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable")]
    PositionUnavailable,
    #[error("location request timed out")]
    Timeout,
}

impl GeoError {
    /// Errors that will not clear up on their own.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self, GeoError::PermissionDenied)
    }
}

/// Snapshot produced by each accepted position update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Progress {
    pub position: Coordinate,
    pub nearest_index: usize,
    pub passed: Vec<Coordinate>,
    pub remaining: Vec<Coordinate>,
    pub remaining_minutes: u32,
    pub eta: EtaLabel,
    pub distance_to_destination_meters: f64,
    pub state: TrackerState,
}

#[derive(Debug, Clone)]
pub struct NavigationTracker {
    path: Vec<Coordinate>,
    estimated_minutes: u32,
    state: TrackerState,
    current_pos: Coordinate,
}

impl NavigationTracker {
    /// Creates an idle tracker positioned at the path's start.
    ///
    /// # Errors
    ///
    /// Returns [`NavError::PathTooShort`] for fewer than two points and
    /// [`NavError::InvalidCoordinate`] for any out-of-range point.
    pub fn new(path: Vec<Coordinate>, estimated_minutes: u32) -> Result<Self, NavError> {
        if path.len() < 2 {
            return Err(NavError::PathTooShort(path.len()));
        }
        if let Some(i) = path.iter().position(|c| !c.is_valid()) {
            return Err(NavError::InvalidCoordinate(i));
        }
        let current_pos = path[0];
        Ok(Self {
            path,
            estimated_minutes,
            state: TrackerState::Idle,
            current_pos,
        })
    }

    #[must_use]
    pub fn state(&self) -> TrackerState {
        self.state
    }

    #[must_use]
    pub fn current_position(&self) -> Coordinate {
        self.current_pos
    }

    #[must_use]
    pub fn path(&self) -> &[Coordinate] {
        &self.path
    }

    #[must_use]
    pub fn destination(&self) -> Coordinate {
        // `new` guarantees at least two points.
        self.path[self.path.len() - 1]
    }

    /// Idle → Tracking. Call once the location subscription is live.
    pub fn start(&mut self) {
        if self.state == TrackerState::Idle {
            self.state = TrackerState::Tracking;
            tracing::debug!(points = self.path.len(), "navigation tracking started");
        }
    }

    /// Applies a position fix. Ignored (returns `None`) unless tracking.
    pub fn update(&mut self, position: Coordinate) -> Option<Progress> {
        if self.state != TrackerState::Tracking {
            return None;
        }
        if !position.is_valid() {
            tracing::warn!(%position, "ignoring invalid position fix");
            return None;
        }

        self.current_pos = position;
        let n = self.path.len();
        let index = nearest_point_index(&self.path, position)?;
        let split = split_path(&self.path, index, position);
        let minutes = remaining_minutes(self.estimated_minutes, index, n);
        let distance_to_destination = haversine_meters(position, self.destination());

        if distance_to_destination < ARRIVAL_THRESHOLD_METERS {
            self.state = TrackerState::Arrived;
            tracing::info!(
                distance_m = distance_to_destination,
                "destination reached"
            );
        }

        Some(Progress {
            position,
            nearest_index: index,
            passed: split.passed,
            remaining: split.remaining,
            remaining_minutes: minutes,
            eta: EtaLabel::from(minutes),
            distance_to_destination_meters: distance_to_destination,
            state: self.state,
        })
    }

    /// Explicit user cancellation. No effect once terminal.
    pub fn cancel(&mut self) {
        if !self.state.is_terminal() {
            self.state = TrackerState::Cancelled;
            tracing::info!("navigation cancelled");
        }
    }

    /// Handles a location-service error.
    ///
    /// Persistent errors cancel the session; transient ones are logged and
    /// the last known position stays in place.
    pub fn location_error(&mut self, error: &GeoError) {
        if self.state.is_terminal() {
            return;
        }
        if error.is_persistent() {
            tracing::warn!(error = %error, "location unavailable for good; cancelling navigation");
            self.state = TrackerState::Cancelled;
        } else {
            tracing::warn!(
                error = %error,
                position = %self.current_pos,
                "location update failed; keeping last known position"
            );
        }
    }
}
