//! Route variant comparison (safety / shortest / balanced).

use safeway_core::{Coordinate, RouteVariant};
use serde::{Deserialize, Serialize};

use crate::geo::{distance_label, path_length_meters, time_label, walking_minutes};
use crate::scoring::SafetyAssessment;

/// Placeholder score reported for the shortest variant in compatibility mode.
pub const SHORTEST_PLACEHOLDER_SCORE: u32 = 72;
/// Placeholder score reported for the balanced variant in compatibility mode.
pub const BALANCED_PLACEHOLDER_SCORE: u32 = 85;

/// Display metrics for one route variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMetrics {
    pub variant: RouteVariant,
    pub score: u32,
    pub distance_label: String,
    pub time_label: String,
    pub distance_meters: f64,
    pub estimated_minutes: u32,
    pub cctv_count: u32,
    pub light_count: u32,
    pub report_count: u32,
    /// Derived by scaling the safety variant rather than scored on its own path.
    pub synthetic: bool,
    pub recommended: bool,
}

impl RouteMetrics {
    fn from_assessment(variant: RouteVariant, path: &[Coordinate], a: &SafetyAssessment) -> Self {
        let distance_meters = path_length_meters(path);
        let estimated_minutes = walking_minutes(distance_meters);
        Self {
            variant,
            score: a.safety_score,
            distance_label: distance_label(distance_meters),
            time_label: time_label(estimated_minutes),
            distance_meters,
            estimated_minutes,
            cctv_count: a.cctv_count,
            light_count: a.light_count,
            report_count: a.report_count,
            synthetic: false,
            recommended: variant == RouteVariant::Safety,
        }
    }
}

/// Builds all three variants from a single scoring result on one path.
///
/// Only the safety variant is real. Shortest and balanced reuse the same
/// path, scale the counts (0.6/0.5 and 0.8/0.8, floored) and carry fixed
/// placeholder scores; both are marked `synthetic`.
#[must_use]
pub fn compare_variants(path: &[Coordinate], scored: &SafetyAssessment) -> [RouteMetrics; 3] {
    let safety = RouteMetrics::from_assessment(RouteVariant::Safety, path, scored);

    let shortest = RouteMetrics {
        variant: RouteVariant::Shortest,
        score: SHORTEST_PLACEHOLDER_SCORE,
        cctv_count: scale(scored.cctv_count, 6),
        light_count: scale(scored.light_count, 5),
        synthetic: true,
        recommended: false,
        ..safety.clone()
    };

    let balanced = RouteMetrics {
        variant: RouteVariant::Balanced,
        score: BALANCED_PLACEHOLDER_SCORE,
        cctv_count: scale(scored.cctv_count, 8),
        light_count: scale(scored.light_count, 8),
        synthetic: true,
        recommended: false,
        ..safety.clone()
    };

    tracing::warn!(
        safety_score = scored.safety_score,
        "shortest and balanced variants are scaled placeholders, not independently scored"
    );

    [safety, shortest, balanced]
}

/// Builds three variants from independently scored paths, in
/// `[safety, shortest, balanced]` order.
#[must_use]
pub fn score_variants(scored: [(&[Coordinate], SafetyAssessment); 3]) -> [RouteMetrics; 3] {
    let [s, sh, b] = scored;
    [
        RouteMetrics::from_assessment(RouteVariant::Safety, s.0, &s.1),
        RouteMetrics::from_assessment(RouteVariant::Shortest, sh.0, &sh.1),
        RouteMetrics::from_assessment(RouteVariant::Balanced, b.0, &b.1),
    ]
}

/// `floor(value * tenths / 10)` without going through floats.
fn scale(value: u32, tenths: u32) -> u32 {
    u32::try_from(u64::from(value) * u64::from(tenths) / 10).unwrap_or(u32::MAX)
}
