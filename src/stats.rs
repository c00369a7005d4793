use log::{debug, warn};

use crate::gpx_types::{GeoPoint, RouteStats};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters between two lat/lng pairs given in degrees.
pub fn haversine_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let to_rad = |deg: f64| deg.to_radians();
    let dlat = to_rad(lat2 - lat1);
    let dlng = to_rad(lng2 - lng1);
    let a = (dlat / 2.0).sin().powi(2)
        + to_rad(lat1).cos() * to_rad(lat2).cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// Total distance and positive elevation gain over consecutive point pairs.
///
/// NaN coordinates or elevations poison the affected running sum. A
/// non-finite total is reported as 0 since `RouteStats` holds integers.
pub fn compute_stats(points: &[GeoPoint]) -> RouteStats {
    let mut distance = 0.0_f64;
    let mut gain = 0.0_f64;

    for pair in points.windows(2) {
        let (prev, cur) = (&pair[0], &pair[1]);
        distance += haversine_distance(prev.lat, prev.lng, cur.lat, cur.lng);

        if let (Some(prev_ele), Some(cur_ele)) = (prev.ele, cur.ele) {
            let delta = cur_ele - prev_ele;
            // NaN > 0.0 is false; add it anyway so it propagates
            if delta > 0.0 || delta.is_nan() {
                gain += delta;
            }
        }
    }

    if !distance.is_finite() || !gain.is_finite() {
        warn!(
            "non-finite route totals (distance={distance}, gain={gain}) over {} points",
            points.len()
        );
    }

    let stats = RouteStats {
        distance_m: round_meters(distance),
        elevation_gain_m: round_meters(gain),
    };
    debug!(
        "computed stats over {} points: {} m, +{} m",
        points.len(),
        stats.distance_m,
        stats.elevation_gain_m
    );
    stats
}

fn round_meters(value: f64) -> i64 {
    // `as` saturates and maps NaN to 0
    value.round() as i64
}
