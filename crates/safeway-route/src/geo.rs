use geo::{HaversineDistance, Point};
use safeway_core::Coordinate;

/// Pedestrian speed used for time estimates: 4 km/h.
pub const WALKING_METERS_PER_HOUR: f64 = 4_000.0;

/// Great-circle distance in meters.
#[must_use]
pub fn haversine_meters(a: Coordinate, b: Coordinate) -> f64 {
    let pa = Point::new(a.lng, a.lat);
    let pb = Point::new(b.lng, b.lat);
    pa.haversine_distance(&pb)
}

/// Sum of consecutive segment lengths.
#[must_use]
pub fn path_length_meters(path: &[Coordinate]) -> f64 {
    path.windows(2)
        .map(|w| haversine_meters(w[0], w[1]))
        .sum()
}

/// Walking time in whole minutes, rounded up; never zero for a non-zero distance.
#[must_use]
pub fn walking_minutes(distance_meters: f64) -> u32 {
    if !(distance_meters.is_finite() && distance_meters > 0.0) {
        return 0;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let minutes = (distance_meters * 60.0 / WALKING_METERS_PER_HOUR).ceil() as u32;
    minutes.max(1)
}

/// `"850m"` below one kilometer, `"1.2km"` at or above.
#[must_use]
pub fn distance_label(distance_meters: f64) -> String {
    let meters = distance_meters.max(0.0).round();
    if meters < 1_000.0 {
        format!("{meters}m")
    } else {
        format!("{:.1}km", distance_meters / 1_000.0)
    }
}

#[must_use]
pub fn time_label(minutes: u32) -> String {
    format!("{minutes}min")
}

/// Inserts intermediate points so no segment is longer than `max_step_meters`.
///
/// Interpolation is linear in degrees, which is accurate at walking scale.
#[must_use]
pub fn densify_path(path: &[Coordinate], max_step_meters: f64) -> Vec<Coordinate> {
    let Some(first) = path.first() else {
        return Vec::new();
    };
    if max_step_meters <= 0.0 {
        return path.to_vec();
    }

    let mut out = vec![*first];
    for w in path.windows(2) {
        let (a, b) = (w[0], w[1]);
        let length = haversine_meters(a, b);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let steps = (length / max_step_meters).ceil().max(1.0) as usize;
        for i in 1..=steps {
            #[allow(clippy::cast_precision_loss)]
            let t = i as f64 / steps as f64;
            out.push(Coordinate::new(
                a.lat + (b.lat - a.lat) * t,
                a.lng + (b.lng - a.lng) * t,
            ));
        }
    }
    out
}

/// Path used when geocoding fails: a short walk north-east of Seoul City Hall.
#[must_use]
pub fn default_path() -> Vec<Coordinate> {
    vec![
        Coordinate::new(37.5668, 126.9790),
        Coordinate::new(37.5669, 126.9791),
        Coordinate::new(37.5670, 126.9792),
    ]
}
