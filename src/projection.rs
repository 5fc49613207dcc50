//! Local planar projection of one cluster onto the unit square.
//!
//! A small equirectangular approximation around the cluster's bounding-box
//! center. Width and height are the largest of three great-circle spans each,
//! so curvature over the box never pushes points far outside `[0, 1]²`.
//! Valid at cluster scale (tens of kilometers), not as a general projection.

use crate::geo_utils::{compute_bounds, haversine_coords};
use crate::GpsPoint;

/// A point in both coordinate systems.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedPoint {
    /// Normalized plane coordinate `[x, y]`, roughly within the unit square.
    pub plane: [f64; 2],
    /// Input position as `[longitude, latitude]`.
    pub geo: [f64; 2],
}

/// Project cluster points, keeping input order.
pub fn project(points: &[GpsPoint]) -> Vec<ProjectedPoint> {
    if points.is_empty() {
        return Vec::new();
    }

    let b = compute_bounds(points);
    let center = b.center();

    let height = [b.min_lng, center.longitude, b.max_lng]
        .into_iter()
        .map(|lng| haversine_coords(b.min_lat, lng, b.max_lat, lng))
        .fold(0.0, f64::max);
    let width = [b.min_lat, center.latitude, b.max_lat]
        .into_iter()
        .map(|lat| haversine_coords(lat, b.min_lng, lat, b.max_lng))
        .fold(0.0, f64::max);

    points
        .iter()
        .map(|p| {
            let east = if p.longitude > center.longitude { 1.0 } else { -1.0 };
            let north = if p.latitude > center.latitude { 1.0 } else { -1.0 };
            let dx = east * haversine_coords(p.latitude, p.longitude, p.latitude, center.longitude);
            let dy = north * haversine_coords(p.latitude, p.longitude, center.latitude, p.longitude);
            ProjectedPoint {
                plane: [normalize(dx, width), normalize(dy, height)],
                geo: [p.longitude, p.latitude],
            }
        })
        .collect()
}

fn normalize(offset: f64, span: f64) -> f64 {
    if span > 0.0 {
        offset / span + 0.5
    } else {
        0.5
    }
}
