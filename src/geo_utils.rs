//! Geographic utilities: distances, bounds, centers and antimeridian checks.
//!
//! All distances are great-circle distances in meters on a spherical Earth.

use crate::{Bounds, GpsPoint};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Longitude (absolute, degrees) beyond which a point is treated as sitting
/// next to the antimeridian.
pub const ANTIMERIDIAN_BAND_DEG: f64 = 170.0;

/// Great-circle distance between two points using the haversine formula.
pub fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    haversine_coords(p1.latitude, p1.longitude, p2.latitude, p2.longitude)
}

/// Haversine distance between raw coordinates (degrees).
pub fn haversine_coords(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Bounding box of a set of points.
///
/// Returns an all-zero box for empty input.
pub fn compute_bounds(points: &[GpsPoint]) -> Bounds {
    Bounds::from_points(points).unwrap_or(Bounds {
        min_lat: 0.0,
        max_lat: 0.0,
        min_lng: 0.0,
        max_lng: 0.0,
    })
}

/// Center of the bounding box of a set of points.
pub fn compute_center(points: &[GpsPoint]) -> GpsPoint {
    if points.is_empty() {
        return GpsPoint::new(0.0, 0.0);
    }
    compute_bounds(points).center()
}

/// Area of a bounding box in square degrees.
///
/// Only meaningful for ordering boxes against each other.
pub fn bounds_area(bounds: &Bounds) -> f64 {
    (bounds.max_lat - bounds.min_lat).abs() * (bounds.max_lng - bounds.min_lng).abs()
}

/// Whether a longitude lies in the band next to the antimeridian.
pub fn near_antimeridian(lng: f64) -> bool {
    lng.abs() > ANTIMERIDIAN_BAND_DEG
}

/// Whether two longitudes lie strictly on the same side of the prime meridian.
///
/// A longitude of exactly zero is on neither side.
pub fn same_hemisphere(lng_a: f64, lng_b: f64) -> bool {
    lng_a * lng_b > 0.0
}
