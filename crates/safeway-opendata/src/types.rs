//! Open-data API response types.
//!
//! A page looks like:
//!
//! ```json
//! {"safeOpenCCTV": {
//!     "list_total_count": 1234,
//!     "RESULT": {"CODE": "INFO-000", "MESSAGE": "OK"},
//!     "row": [{"WGSXPT": "37.56", "WGSYPT": "126.97", ...}]
//! }}
//! ```
//!
//! Errors and empty results come back as a bare `{"RESULT": {...}}`. Row
//! schemas differ between datasets, so rows stay as JSON maps and
//! coordinates are pulled out by [`row_coordinate`].

use safeway_core::Coordinate;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Result code for a normal page.
pub const CODE_OK: &str = "INFO-000";
/// Result code for "no matching data"; treated as an empty page.
pub const CODE_NO_DATA: &str = "INFO-200";

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceResult {
    #[serde(rename = "CODE")]
    pub code: String,
    #[serde(rename = "MESSAGE", default)]
    pub message: String,
}

impl ServiceResult {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.code == CODE_OK
    }

    #[must_use]
    pub fn is_no_data(&self) -> bool {
        self.code == CODE_NO_DATA
    }
}

/// One page of a dataset.
#[derive(Debug, Clone, Deserialize)]
pub struct ServicePage {
    #[serde(default)]
    pub list_total_count: u32,
    #[serde(rename = "RESULT", default)]
    pub result: Option<ServiceResult>,
    #[serde(default)]
    pub row: Vec<Map<String, Value>>,
}

impl ServicePage {
    pub(crate) fn empty() -> Self {
        Self {
            list_total_count: 0,
            result: None,
            row: Vec::new(),
        }
    }
}

const LAT_KEYS: &[&str] = &["WGSXPT", "LAT", "LATITUDE", "LA", "Y_COORD"];
const LNG_KEYS: &[&str] = &["WGSYPT", "LOT", "LNG", "LONGITUDE", "LO", "X_COORD"];

fn number_field(row: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| match row.get(*k)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// Extracts a WGS-84 coordinate from a dataset row.
///
/// Some datasets label the axes inconsistently, so a pair that is only valid
/// swapped is swapped. Rows with no usable pair yield `None`.
#[must_use]
pub fn row_coordinate(row: &Map<String, Value>) -> Option<Coordinate> {
    let a = number_field(row, LAT_KEYS)?;
    let b = number_field(row, LNG_KEYS)?;

    // Unsurveyed rows are published as 0,0.
    if a == 0.0 && b == 0.0 {
        return None;
    }
    let direct = Coordinate::new(a, b);
    if direct.is_valid() {
        return Some(direct);
    }
    let swapped = Coordinate::new(b, a);
    swapped.is_valid().then_some(swapped)
}
