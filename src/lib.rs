pub mod clock;
pub mod converter;
pub mod error;
pub mod gpx_types;
pub mod options;
pub mod parser;
pub mod stats;
pub mod writer;

use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;

pub use crate::error::RouteError;
pub use crate::gpx_types::{GeoPoint, ParsedRoute, RouteStats, SampleForExport, Waypoint};
pub use crate::parser::{parse_gpx, parse_gpx_with};
pub use crate::stats::compute_stats;
pub use crate::writer::{generate_gpx, generate_gpx_with};

use crate::clock::SystemClock;
use crate::options::{ConvertOptions, ExportOptions, ParseOptions};

/// Parse a GPX string into `{ name, trackpoints, waypoints }`.
#[wasm_bindgen(js_name = parseGpx)]
pub fn parse_gpx_js(gpx_string: &str, options: JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let opts: ParseOptions = options_or_default(options)?;
    let route = parser::parse_gpx_with(gpx_string, &opts)?;
    to_js(&route)
}

/// Generate a GPX 1.1 document from `[{ latitude, longitude, altitude?, timestampMs }]`.
#[wasm_bindgen(js_name = generateGpx)]
pub fn generate_gpx_js(samples: JsValue, options: JsValue) -> Result<String, JsValue> {
    console_error_panic_hook::set_once();

    let samples: Vec<SampleForExport> =
        serde_wasm_bindgen::from_value(samples).map_err(RouteError::from)?;
    let opts: ExportOptions = options_or_default(options)?;
    Ok(writer::generate_gpx_with(&samples, &opts, &SystemClock))
}

/// Compute `{ distanceM, elevationGainM }` for `[{ lat, lng, ele? }]`.
#[wasm_bindgen(js_name = computeRouteStats)]
pub fn compute_route_stats_js(points: JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let points: Vec<GeoPoint> =
        serde_wasm_bindgen::from_value(points).map_err(RouteError::from)?;
    to_js(&stats::compute_stats(&points))
}

/// Convert GPX string to GeoJSON, returned as a JS object.
#[wasm_bindgen(js_name = gpxToGeoJson)]
pub fn gpx_to_geojson(gpx_string: &str, options: JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let opts: ConvertOptions = options_or_default(options)?;
    let route = parser::parse_gpx(gpx_string);
    let fc = converter::to_feature_collection(&route, &opts);
    to_js(&fc)
}

/// Convert GPX string to GeoJSON, returned as a JSON string.
#[wasm_bindgen(js_name = gpxToGeoJsonString)]
pub fn gpx_to_geojson_string(gpx_string: &str, options: JsValue) -> Result<String, JsValue> {
    console_error_panic_hook::set_once();

    let opts: ConvertOptions = options_or_default(options)?;
    let route = parser::parse_gpx(gpx_string);
    let fc = converter::to_feature_collection(&route, &opts);
    Ok(serde_json::to_string(&fc).map_err(RouteError::from)?)
}

fn options_or_default<T: DeserializeOwned + Default>(options: JsValue) -> Result<T, JsValue> {
    if options.is_undefined() || options.is_null() {
        Ok(T::default())
    } else {
        Ok(serde_wasm_bindgen::from_value(options).map_err(RouteError::from)?)
    }
}

/// Maps become plain JS objects so GeoJSON properties read like JSON.
fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    Ok(value.serialize(&serializer).map_err(RouteError::from)?)
}
