//! Spatial index over the clusters of one snapshot.
//!
//! Uses an R-tree to find the clusters whose bounding boxes intersect a
//! viewport.

use rstar::{RTree, RTreeObject, AABB};

use crate::{Bounds, ClusterRecord};

/// Cluster bounds wrapper for R-tree indexing.
#[derive(Debug, Clone)]
pub struct ClusterBounds {
    /// Position of the cluster in the snapshot's cluster list.
    pub slot: usize,
    pub south: f64,
    pub north: f64,
    pub west: f64,
    pub east: f64,
}

impl ClusterBounds {
    /// Strict overlap: shared edges or corners do not count.
    fn overlaps_interior(&self, viewport: &Bounds) -> bool {
        self.south < viewport.max_lat
            && self.north > viewport.min_lat
            && self.west < viewport.max_lng
            && self.east > viewport.min_lng
    }
}

impl RTreeObject for ClusterBounds {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners([self.west, self.south], [self.east, self.north])
    }
}

/// Viewport index for a snapshot's clusters.
#[derive(Debug)]
pub struct SnapshotIndex {
    tree: RTree<ClusterBounds>,
}

impl SnapshotIndex {
    /// Bulk-load the index from a snapshot's clusters.
    pub fn build(clusters: &[ClusterRecord]) -> Self {
        let bounds: Vec<ClusterBounds> = clusters
            .iter()
            .enumerate()
            .map(|(slot, c)| ClusterBounds {
                slot,
                south: c.south,
                north: c.north,
                west: c.west,
                east: c.east,
            })
            .collect();

        Self {
            tree: RTree::bulk_load(bounds),
        }
    }

    /// Slots of clusters overlapping the viewport, in ascending order.
    ///
    /// Boxes that only touch the viewport edge are not returned.
    pub fn query_viewport(&self, viewport: &Bounds) -> Vec<usize> {
        let search = AABB::from_corners(
            [viewport.min_lng, viewport.min_lat],
            [viewport.max_lng, viewport.max_lat],
        );

        let mut slots: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&search)
            .filter(|b| b.overlaps_interior(viewport))
            .map(|b| b.slot)
            .collect();
        slots.sort_unstable();
        slots
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
