//! Triangulation vectors: distances from a point to three fixed anchors.
//!
//! For any anchor `A` and points `P`, `Q`, the triangle inequality gives
//! `|d(A, P) - d(A, Q)| <= d(P, Q)`. The largest component difference
//! between two vectors is therefore a lower bound on the true distance,
//! which makes it a cheap, trigonometry-free reject test.

use serde::{Deserialize, Serialize};

use crate::geo_utils::haversine_coords;
use crate::GpsPoint;

/// Reference anchors as (latitude, longitude): central Europe, the
/// Americas and the Indian Ocean.
pub const ANCHORS: [(f64, f64); 3] = [(48.0, 10.0), (10.0, -75.0), (-20.0, 75.0)];

/// Distances in meters from a point to each of the [`ANCHORS`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriangulationVector(pub [f64; 3]);

impl TriangulationVector {
    /// Compute the vector for a position.
    pub fn from_point(point: &GpsPoint) -> Self {
        let mut components = [0.0; 3];
        for (component, (lat, lng)) in components.iter_mut().zip(ANCHORS) {
            *component = haversine_coords(point.latitude, point.longitude, lat, lng);
        }
        Self(components)
    }

    /// Largest absolute component-wise difference to another vector.
    pub fn max_delta(&self, other: &TriangulationVector) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }
}
