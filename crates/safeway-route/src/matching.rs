//! Nearest-point matching of a live position against a precomputed path.

use safeway_core::Coordinate;
use serde::Serialize;

use crate::geo::haversine_meters;

/// A path split at the matched index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathSplit {
    /// `path[0..=index]`.
    pub passed: Vec<Coordinate>,
    /// `[position] ++ path[index + 1..]`.
    pub remaining: Vec<Coordinate>,
}

/// Remaining-time display value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "minutes", rename_all = "snake_case")]
pub enum EtaLabel {
    Minutes(u32),
    ArrivingSoon,
}

impl std::fmt::Display for EtaLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EtaLabel::Minutes(m) => write!(f, "{m}min"),
            EtaLabel::ArrivingSoon => f.write_str("arriving soon"),
        }
    }
}

impl From<u32> for EtaLabel {
    fn from(minutes: u32) -> Self {
        if minutes == 0 {
            EtaLabel::ArrivingSoon
        } else {
            EtaLabel::Minutes(minutes)
        }
    }
}

/// Index of the path point closest to `position`.
///
/// Scans left to right and only replaces the best match on a strictly
/// smaller distance, so ties resolve to the lowest index. `None` for an
/// empty path.
#[must_use]
pub fn nearest_point_index(path: &[Coordinate], position: Coordinate) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, point) in path.iter().enumerate() {
        let d = haversine_meters(position, *point);
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((i, d)),
        }
    }
    best.map(|(i, _)| i)
}

/// Splits `path` at `index`, prefixing the remaining part with `position`
/// so the remaining polyline starts at the live location.
///
/// `index` past the end is clamped to the last point.
#[must_use]
pub fn split_path(path: &[Coordinate], index: usize, position: Coordinate) -> PathSplit {
    if path.is_empty() {
        return PathSplit {
            passed: Vec::new(),
            remaining: vec![position],
        };
    }
    let index = index.min(path.len() - 1);

    let passed = path[..=index].to_vec();
    let mut remaining = Vec::with_capacity(path.len() - index);
    remaining.push(position);
    remaining.extend_from_slice(&path[index + 1..]);

    PathSplit { passed, remaining }
}

/// `ceil(total * max(0, (n - index) / n))`, computed in integers.
#[must_use]
pub fn remaining_minutes(total_minutes: u32, index: usize, point_count: usize) -> u32 {
    if point_count == 0 {
        return 0;
    }
    let left = point_count.saturating_sub(index) as u64;
    let n = point_count as u64;
    let minutes = (u64::from(total_minutes) * left).div_ceil(n);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}
