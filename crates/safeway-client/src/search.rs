//! Route search: place names in, three scored route variants out.

use safeway_core::Coordinate;
use safeway_geocode::{GeocodeClient, GeocodeError, PlaceMatch};
use safeway_route::{compare_variants, default_path, densify_path, haversine_meters, RouteMetrics};

use crate::api::ApiClient;
use crate::error::ClientError;
use crate::session::Session;

/// Target spacing between path points sent for scoring.
pub const PATH_STEP_METERS: f64 = 20.0;
/// Keeps densified paths within the server's point limit.
const MAX_PATH_STEPS: f64 = 1_998.0;

#[derive(Debug, Clone, PartialEq)]
pub struct RouteOptions {
    pub start_label: String,
    pub end_label: String,
    pub path: Vec<Coordinate>,
    /// Safety, shortest, balanced; safety is recommended.
    pub variants: [RouteMetrics; 3],
    /// Geocoding found nothing and the built-in default path was scored.
    pub used_default_path: bool,
}

impl RouteOptions {
    #[must_use]
    pub fn recommended(&self) -> &RouteMetrics {
        self.variants
            .iter()
            .find(|v| v.recommended)
            .unwrap_or(&self.variants[0])
    }
}

/// Geocodes both ends, scores the connecting path and derives the three
/// variants.
///
/// A place that cannot be found does not fail the search: the default path
/// is scored instead and `used_default_path` is set.
///
/// # Errors
///
/// - [`ClientError::Validation`] for a blank start or end.
/// - [`ClientError::Geocode`] for transport failures of the geocoder.
/// - Any [`ApiClient::score_route`] error.
pub async fn search_routes(
    geocoder: &GeocodeClient,
    api: &ApiClient,
    session: &Session,
    start: &str,
    end: &str,
) -> Result<RouteOptions, ClientError> {
    let resolved = tokio::try_join!(geocoder.geocode(start), geocoder.geocode(end));

    let (path, start_label, end_label, used_default_path) = match resolved {
        Ok((from, to)) => (straight_path(&from, &to), from.label, to.label, false),
        Err(GeocodeError::LocationNotFound { query }) => {
            tracing::warn!(%query, "location not found; scoring the default path");
            (
                default_path(),
                start.trim().to_owned(),
                end.trim().to_owned(),
                true,
            )
        }
        Err(GeocodeError::EmptyQuery) => {
            return Err(ClientError::Validation(
                "start and destination are required".to_owned(),
            ))
        }
        Err(e) => return Err(e.into()),
    };

    let assessment = api.score_route(session, &path).await?;
    let variants = compare_variants(&path, &assessment);

    Ok(RouteOptions {
        start_label,
        end_label,
        path,
        variants,
        used_default_path,
    })
}

/// Straight walking line between two places, densified for scoring.
fn straight_path(from: &PlaceMatch, to: &PlaceMatch) -> Vec<Coordinate> {
    let length = haversine_meters(from.coordinate, to.coordinate);
    let step = PATH_STEP_METERS.max(length / MAX_PATH_STEPS);
    densify_path(&[from.coordinate, to.coordinate], step)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(lat: f64, lng: f64) -> PlaceMatch {
        PlaceMatch {
            label: "p".to_owned(),
            coordinate: Coordinate::new(lat, lng),
        }
    }

    #[test]
    fn straight_path_keeps_endpoints() {
        let from = place(37.5547, 126.9707);
        let to = place(37.5663, 126.9779);
        let path = straight_path(&from, &to);

        assert_eq!(path.first(), Some(&from.coordinate));
        let last = path.last().unwrap();
        assert!(haversine_meters(*last, to.coordinate) < 0.01);
        assert!(path.len() > 2);
    }

    #[test]
    fn long_paths_stay_under_point_limit() {
        let path = straight_path(&place(37.0, 126.0), &place(38.0, 128.0));
        assert!(path.len() <= 2000, "got {}", path.len());
    }
}
