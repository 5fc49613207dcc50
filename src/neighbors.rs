//! Fixed-radius neighbor search over a snapshot of report points.
//!
//! Candidates pass through progressively more expensive filters:
//! 1. the subject itself is skipped
//! 2. triangulation-vector pre-filter (no trigonometry)
//! 3. antimeridian side check for subjects near ±180°
//! 4. exact haversine distance
//!
//! Stages 1, 2 and 4 never change the result compared to running stage 4
//! alone; stage 3 only applies inside the antimeridian band.

use crate::config::ClusteringConfig;
use crate::geo_utils::{haversine_distance, near_antimeridian, same_hemisphere};
use crate::NotificationPoint;

/// Neighbor finder with a fixed maximum distance.
#[derive(Debug, Clone, Copy)]
pub struct NeighborFinder {
    max_distance: f64,
    prefilter: f64,
}

impl NeighborFinder {
    /// Create a finder for `max_distance` meters with the given pre-filter
    /// threshold. The threshold is raised to `max_distance` if lower, so the
    /// pre-filter can never drop a true neighbor.
    pub fn new(max_distance: f64, triangulation_threshold: f64) -> Self {
        Self {
            max_distance,
            prefilter: triangulation_threshold.max(max_distance),
        }
    }

    pub fn from_config(config: &ClusteringConfig) -> Self {
        Self::new(config.max_distance, config.triangulation_threshold)
    }

    pub fn max_distance(&self) -> f64 {
        self.max_distance
    }

    /// Indices of all points within the maximum distance of `points[subject]`,
    /// in input order.
    pub fn neighbors(&self, points: &[NotificationPoint], subject: usize) -> Vec<usize> {
        let node = &points[subject];
        let antimeridian = near_antimeridian(node.position.longitude);

        points
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != subject)
            .filter(|(_, n)| node.triangulation.max_delta(&n.triangulation) <= self.prefilter)
            .filter(|(_, n)| {
                !antimeridian || same_hemisphere(n.position.longitude, node.position.longitude)
            })
            .filter(|(_, n)| haversine_distance(&node.position, &n.position) <= self.max_distance)
            .map(|(i, _)| i)
            .collect()
    }

    /// Reference implementation: exact distance check only.
    pub fn neighbors_exact(&self, points: &[NotificationPoint], subject: usize) -> Vec<usize> {
        let node = &points[subject];
        points
            .iter()
            .enumerate()
            .filter(|(i, n)| {
                *i != subject && haversine_distance(&node.position, &n.position) <= self.max_distance
            })
            .map(|(i, _)| i)
            .collect()
    }
}
