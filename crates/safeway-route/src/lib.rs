//! Route safety aggregation and live navigation tracking.
//!
//! Everything here is pure or single-task: distance math, nearest-point
//! matching, route-variant comparison, the pluggable safety scoring policy,
//! and the navigation tracker state machine with its async driver.

pub mod driver;
pub mod geo;
pub mod matching;
pub mod scoring;
pub mod tracker;
pub mod variants;

pub use driver::{run_navigation, LocationProvider, WatchSubscription};
pub use geo::{
    default_path, densify_path, distance_label, haversine_meters, path_length_meters, time_label,
    walking_minutes,
};
pub use matching::{nearest_point_index, remaining_minutes, split_path, EtaLabel, PathSplit};
pub use scoring::{
    count_near_path, path_bounds, InfrastructureCounts, LinearPolicy, SafetyAssessment,
    ScoringPolicy,
};
pub use tracker::{
    GeoError, NavigationTracker, Progress, TrackerState, ARRIVAL_THRESHOLD_METERS,
};
pub use variants::{compare_variants, score_variants, RouteMetrics};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NavError {
    #[error("path must contain at least 2 points, got {0}")]
    PathTooShort(usize),

    #[error("path contains an invalid coordinate at index {0}")]
    InvalidCoordinate(usize),
}
