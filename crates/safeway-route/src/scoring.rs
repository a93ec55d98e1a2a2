//! Route safety scoring.
//!
//! Counting nearby infrastructure is fixed; turning counts into a score is
//! delegated to a [`ScoringPolicy`], so the formula can be swapped or
//! reconfigured without touching callers.

use safeway_core::{Coordinate, ScoringPolicyConfig};
use serde::{Deserialize, Serialize};

use crate::geo::haversine_meters;

const METERS_PER_DEGREE_LAT: f64 = 111_320.0;

/// Safety infrastructure found near a path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfrastructureCounts {
    pub cctv: u32,
    pub lights: u32,
    pub reports: u32,
}

/// Result of scoring one path; also the `POST /api/route/safety` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyAssessment {
    pub safety_score: u32,
    pub cctv_count: u32,
    pub light_count: u32,
    #[serde(default)]
    pub report_count: u32,
}

/// Maps infrastructure counts to a 0–100 score.
pub trait ScoringPolicy: Send + Sync {
    /// Distance within which infrastructure counts toward a path.
    fn radius_meters(&self) -> f64;

    /// Score in `0..=100`.
    fn score(&self, counts: &InfrastructureCounts) -> u32;

    fn assess(&self, counts: InfrastructureCounts) -> SafetyAssessment {
        SafetyAssessment {
            safety_score: self.score(&counts).min(100),
            cctv_count: counts.cctv,
            light_count: counts.lights,
            report_count: counts.reports,
        }
    }
}

/// `base + cctv·w_c + lights·w_l − reports·p`, clamped to `0..=100`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearPolicy {
    config: ScoringPolicyConfig,
}

impl LinearPolicy {
    #[must_use]
    pub fn new(config: ScoringPolicyConfig) -> Self {
        Self { config }
    }
}

impl Default for LinearPolicy {
    fn default() -> Self {
        Self::new(ScoringPolicyConfig::default())
    }
}

impl ScoringPolicy for LinearPolicy {
    fn radius_meters(&self) -> f64 {
        self.config.radius_meters
    }

    fn score(&self, counts: &InfrastructureCounts) -> u32 {
        let c = &self.config;
        let raw = c.base + f64::from(counts.cctv) * c.cctv_weight
            + f64::from(counts.lights) * c.light_weight
            - f64::from(counts.reports) * c.report_penalty;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let score = raw.clamp(0.0, 100.0).round() as u32;
        score
    }
}

/// Counts `points` lying within `radius_meters` of the polyline `path`.
///
/// A bounding-box prefilter skips points that cannot be in range; the rest
/// are measured against every segment (or the single point of a
/// one-point path).
#[must_use]
pub fn count_near_path(path: &[Coordinate], points: &[Coordinate], radius_meters: f64) -> u32 {
    let Some(bbox) = BoundingBox::around(path, radius_meters) else {
        return 0;
    };

    let count = points
        .iter()
        .filter(|p| p.is_valid() && bbox.contains(**p))
        .filter(|p| distance_to_path(path, **p) <= radius_meters)
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// South-west and north-east corners of the box that can hold any point
/// within `radius_meters` of `path`. `None` for an empty path.
#[must_use]
pub fn path_bounds(path: &[Coordinate], radius_meters: f64) -> Option<(Coordinate, Coordinate)> {
    let bbox = BoundingBox::around(path, radius_meters)?;
    Some((
        Coordinate::new(bbox.min_lat, bbox.min_lng),
        Coordinate::new(bbox.max_lat, bbox.max_lng),
    ))
}

fn distance_to_path(path: &[Coordinate], point: Coordinate) -> f64 {
    if path.len() == 1 {
        return haversine_meters(path[0], point);
    }
    path.windows(2)
        .map(|w| distance_to_segment(w[0], w[1], point))
        .fold(f64::INFINITY, f64::min)
}

/// Point-to-segment distance on a local equirectangular projection
/// centered on `p`; accurate for segments up to a few kilometers.
fn distance_to_segment(a: Coordinate, b: Coordinate, p: Coordinate) -> f64 {
    let cos_lat = p.lat.to_radians().cos();
    let project = |c: Coordinate| {
        (
            (c.lng - p.lng) * cos_lat * METERS_PER_DEGREE_LAT,
            (c.lat - p.lat) * METERS_PER_DEGREE_LAT,
        )
    };
    let (ax, ay) = project(a);
    let (bx, by) = project(b);

    let (dx, dy) = (bx - ax, by - ay);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return haversine_meters(a, p);
    }
    // Projection of the origin (p) onto the segment, clamped to its ends.
    let t = (-(ax * dx + ay * dy) / len_sq).clamp(0.0, 1.0);
    let (cx, cy) = (ax + t * dx, ay + t * dy);
    (cx * cx + cy * cy).sqrt()
}

#[derive(Debug, Clone, Copy)]
struct BoundingBox {
    min_lat: f64,
    max_lat: f64,
    min_lng: f64,
    max_lng: f64,
}

impl BoundingBox {
    fn around(path: &[Coordinate], radius_meters: f64) -> Option<Self> {
        let first = path.first()?;
        let mut bbox = Self {
            min_lat: first.lat,
            max_lat: first.lat,
            min_lng: first.lng,
            max_lng: first.lng,
        };
        for c in &path[1..] {
            bbox.min_lat = bbox.min_lat.min(c.lat);
            bbox.max_lat = bbox.max_lat.max(c.lat);
            bbox.min_lng = bbox.min_lng.min(c.lng);
            bbox.max_lng = bbox.max_lng.max(c.lng);
        }

        let lat_pad = radius_meters / METERS_PER_DEGREE_LAT;
        let widest_lat = bbox.min_lat.abs().max(bbox.max_lat.abs()).min(89.0);
        let lng_pad = radius_meters / (METERS_PER_DEGREE_LAT * widest_lat.to_radians().cos());
        // Small margin so the prefilter never rejects a point the exact check would keep.
        let margin = 1.1;

        bbox.min_lat -= lat_pad * margin;
        bbox.max_lat += lat_pad * margin;
        bbox.min_lng -= lng_pad * margin;
        bbox.max_lng += lng_pad * margin;
        Some(bbox)
    }

    fn contains(&self, c: Coordinate) -> bool {
        (self.min_lat..=self.max_lat).contains(&c.lat)
            && (self.min_lng..=self.max_lng).contains(&c.lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> Vec<Coordinate> {
        vec![Coordinate::new(37.5000, 127.0000), Coordinate::new(37.5010, 127.0000)]
    }

    #[test]
    fn counts_points_along_segment_not_just_vertices() {
        // Midpoint of the segment, ~5 m east: far from both vertices (~55 m).
        let midpoint_east = Coordinate::new(37.5005, 127.000_05);
        assert_eq!(count_near_path(&path(), &[midpoint_east], 20.0), 1);
    }

    #[test]
    fn ignores_points_outside_radius() {
        let far = Coordinate::new(37.5005, 127.0100);
        assert_eq!(count_near_path(&path(), &[far], 50.0), 0);
    }

    #[test]
    fn single_point_path_uses_point_distance() {
        let single = vec![Coordinate::new(37.5, 127.0)];
        let near = Coordinate::new(37.5001, 127.0);
        let far = Coordinate::new(37.502, 127.0);
        assert_eq!(count_near_path(&single, &[near, far], 30.0), 1);
    }

    #[test]
    fn path_bounds_cover_the_radius() {
        let (sw, ne) = path_bounds(&path(), 50.0).unwrap();
        assert!(sw.lat < 37.5000 && ne.lat > 37.5010);
        assert!(sw.lng < 127.0 && ne.lng > 127.0);
        // 50 m is ~0.00045 degrees of latitude.
        assert!(37.5000 - sw.lat > 0.00045);
        assert!(path_bounds(&[], 50.0).is_none());
    }

    #[test]
    fn empty_path_counts_nothing() {
        assert_eq!(count_near_path(&[], &[Coordinate::new(37.5, 127.0)], 50.0), 0);
    }

    #[test]
    fn invalid_points_are_skipped() {
        let bogus = Coordinate::new(f64::NAN, 127.0);
        assert_eq!(count_near_path(&path(), &[bogus], 50.0), 0);
    }

    #[test]
    fn linear_policy_applies_weights_and_clamps() {
        let policy = LinearPolicy::default();
        let score = policy.score(&InfrastructureCounts {
            cctv: 5,
            lights: 10,
            reports: 0,
        });
        assert_eq!(score, 70);

        let saturated = policy.score(&InfrastructureCounts {
            cctv: 100,
            lights: 100,
            reports: 0,
        });
        assert_eq!(saturated, 100);

        let floor = policy.score(&InfrastructureCounts {
            cctv: 0,
            lights: 0,
            reports: 50,
        });
        assert_eq!(floor, 0);
    }

    #[test]
    fn assessment_serializes_camel_case() {
        let assessment = LinearPolicy::default().assess(InfrastructureCounts {
            cctv: 5,
            lights: 10,
            reports: 1,
        });
        let json = serde_json::to_value(assessment).unwrap();
        assert_eq!(json["safetyScore"], 65);
        assert_eq!(json["cctvCount"], 5);
        assert_eq!(json["lightCount"], 10);
        assert_eq!(json["reportCount"], 1);
    }

    #[test]
    fn assessment_accepts_missing_report_count() {
        let parsed: SafetyAssessment =
            serde_json::from_str(r#"{"safetyScore":78,"cctvCount":5,"lightCount":10}"#).unwrap();
        assert_eq!(parsed.report_count, 0);
        assert_eq!(parsed.safety_score, 78);
    }
}
