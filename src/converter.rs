use geojson::{Feature, FeatureCollection, Geometry, Value};
use serde_json::{Map, Value as JsonValue};

use crate::gpx_types::*;
use crate::options::{ConvertOptions, GpxElementType};

/// Convert a parsed route to a GeoJSON FeatureCollection.
///
/// Waypoints come first, then the track: a LineString for two or more
/// trackpoints, a Point for exactly one.
pub fn to_feature_collection(route: &ParsedRoute, opts: &ConvertOptions) -> FeatureCollection {
    let mut features = Vec::new();

    if opts.should_include(GpxElementType::Waypoint) {
        for wpt in &route.waypoints {
            features.push(waypoint_to_feature(wpt, opts));
        }
    }

    if opts.should_include(GpxElementType::Track) {
        if let Some(feature) = track_to_feature(route, opts) {
            features.push(feature);
        }
    }

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn waypoint_to_feature(wpt: &Waypoint, opts: &ConvertOptions) -> Feature {
    let geometry = Geometry::new(Value::Point(vec![wpt.lng, wpt.lat]));

    let mut props = Map::new();
    props.insert(
        "gpxType".to_string(),
        JsonValue::String("waypoint".to_string()),
    );

    if opts.include_metadata {
        insert_optional(&mut props, "name", &wpt.name);
        insert_optional(&mut props, "type", &wpt.point_type);
    }

    feature(geometry, props)
}

fn track_to_feature(route: &ParsedRoute, opts: &ConvertOptions) -> Option<Feature> {
    let value = match route.trackpoints.as_slice() {
        [] => return None,
        [pt] => Value::Point(point_coords(pt, opts.include_elevation)),
        points => Value::LineString(
            points
                .iter()
                .map(|pt| point_coords(pt, opts.include_elevation))
                .collect(),
        ),
    };

    let mut props = Map::new();
    props.insert(
        "gpxType".to_string(),
        JsonValue::String("track".to_string()),
    );

    if opts.include_metadata {
        props.insert("name".to_string(), JsonValue::String(route.name.clone()));
    }

    if opts.include_stats {
        let stats = route.stats();
        props.insert("distanceM".to_string(), JsonValue::from(stats.distance_m));
        props.insert(
            "elevationGainM".to_string(),
            JsonValue::from(stats.elevation_gain_m),
        );
    }

    Some(feature(Geometry::new(value), props))
}

fn feature(geometry: Geometry, props: Map<String, JsonValue>) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: Some(props),
        foreign_members: None,
    }
}

/// Build [lng, lat] or [lng, lat, ele] coordinate array.
fn point_coords(pt: &GeoPoint, include_elevation: bool) -> Vec<f64> {
    match (include_elevation, pt.ele) {
        (true, Some(ele)) => vec![pt.lng, pt.lat, ele],
        _ => vec![pt.lng, pt.lat],
    }
}

fn insert_optional(props: &mut Map<String, JsonValue>, key: &str, value: &Option<String>) {
    if let Some(v) = value {
        props.insert(key.to_string(), JsonValue::String(v.clone()));
    }
}
