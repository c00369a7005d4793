use serde::{Deserialize, Serialize};

/// Route name used when the document carries no `<name>` element.
pub const DEFAULT_ROUTE_NAME: &str = "Unnamed Route";

/// A single trackpoint.
///
/// Coordinates are whatever numeric text the source held; malformed text
/// decodes to NaN rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ele: Option<f64>,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            ele: None,
        }
    }

    pub fn with_ele(lat: f64, lng: f64, ele: f64) -> Self {
        Self {
            lat,
            lng,
            ele: Some(ele),
        }
    }
}

/// A named point of interest (<wpt>).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub point_type: Option<String>,
}

impl Waypoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            name: None,
            point_type: None,
        }
    }
}

/// Decoded content of one GPX document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedRoute {
    pub name: String,
    pub trackpoints: Vec<GeoPoint>,
    pub waypoints: Vec<Waypoint>,
}

impl Default for ParsedRoute {
    fn default() -> Self {
        Self {
            name: DEFAULT_ROUTE_NAME.to_string(),
            trackpoints: Vec::new(),
            waypoints: Vec::new(),
        }
    }
}

impl ParsedRoute {
    /// Distance and elevation gain along the trackpoints.
    pub fn stats(&self) -> RouteStats {
        crate::stats::compute_stats(&self.trackpoints)
    }
}

/// A recorded sample handed to the GPX writer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleForExport {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub altitude: Option<f64>,
    pub timestamp_ms: i64,
}

impl SampleForExport {
    pub fn to_geo_point(&self) -> GeoPoint {
        GeoPoint {
            lat: self.latitude,
            lng: self.longitude,
            ele: self.altitude,
        }
    }
}

/// Whole-meter route totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStats {
    pub distance_m: i64,
    pub elevation_gain_m: i64,
}
