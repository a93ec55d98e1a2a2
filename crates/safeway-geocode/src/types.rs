//! Local search API response types.
//!
//! Every endpoint wraps results in `{"documents": [...], "meta": {...}}`.
//! Coordinates arrive as strings with `x` = longitude and `y` = latitude.

use safeway_core::Coordinate;
use serde::{Deserialize, Serialize};

/// `{"documents": [...]}` envelope shared by all endpoints.
#[derive(Debug, Deserialize)]
pub struct DocumentsResponse<T> {
    #[serde(default = "Vec::new")]
    pub documents: Vec<T>,
}

/// One hit from `search/keyword.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct KeywordDocument {
    pub place_name: String,
    #[serde(default)]
    pub address_name: String,
    #[serde(default)]
    pub road_address_name: String,
    pub x: String,
    pub y: String,
}

/// One hit from `search/address.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct AddressDocument {
    pub address_name: String,
    pub x: String,
    pub y: String,
}

/// One hit from `geo/coord2address.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct RegionDocument {
    #[serde(default)]
    pub road_address: Option<NamedAddress>,
    #[serde(default)]
    pub address: Option<NamedAddress>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedAddress {
    pub address_name: String,
}

/// A resolved place: best label plus coordinate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceMatch {
    pub label: String,
    pub coordinate: Coordinate,
}

/// Parses the string `x`/`y` pair into a coordinate.
pub(crate) fn parse_xy(x: &str, y: &str) -> Option<Coordinate> {
    let lng = x.trim().parse::<f64>().ok()?;
    let lat = y.trim().parse::<f64>().ok()?;
    let c = Coordinate::new(lat, lng);
    c.is_valid().then_some(c)
}

impl KeywordDocument {
    pub(crate) fn to_match(&self) -> Option<PlaceMatch> {
        Some(PlaceMatch {
            label: self.place_name.clone(),
            coordinate: parse_xy(&self.x, &self.y)?,
        })
    }
}

impl AddressDocument {
    pub(crate) fn to_match(&self) -> Option<PlaceMatch> {
        Some(PlaceMatch {
            label: self.address_name.clone(),
            coordinate: parse_xy(&self.x, &self.y)?,
        })
    }
}

impl RegionDocument {
    /// Road address when present, otherwise the lot-number address.
    pub(crate) fn label(&self) -> Option<String> {
        self.road_address
            .as_ref()
            .or(self.address.as_ref())
            .map(|a| a.address_name.clone())
            .filter(|s| !s.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_xy_swaps_into_lat_lng() {
        let c = parse_xy("126.9784", "37.5666").unwrap();
        assert!((c.lat - 37.5666).abs() < 1e-9);
        assert!((c.lng - 126.9784).abs() < 1e-9);
    }

    #[test]
    fn parse_xy_rejects_garbage_and_out_of_range() {
        assert!(parse_xy("abc", "37.0").is_none());
        assert!(parse_xy("127.0", "95.0").is_none());
    }

    #[test]
    fn region_label_prefers_road_address() {
        let doc: RegionDocument = serde_json::from_value(serde_json::json!({
            "road_address": {"address_name": "Sejong-daero 110"},
            "address": {"address_name": "Taepyeongno 1-ga 31"}
        }))
        .unwrap();
        assert_eq!(doc.label().as_deref(), Some("Sejong-daero 110"));

        let lot_only: RegionDocument = serde_json::from_value(serde_json::json!({
            "road_address": null,
            "address": {"address_name": "Taepyeongno 1-ga 31"}
        }))
        .unwrap();
        assert_eq!(lot_only.label().as_deref(), Some("Taepyeongno 1-ga 31"));
    }
}
