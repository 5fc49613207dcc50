//! # Clustering Engine
//!
//! Runs one clustering pass over a snapshot of report points and turns every
//! cluster into a persistable [`ClusterRecord`].
//!
//! ## Architecture
//!
//! The engine is composed of focused modules:
//! - `store` - `NotificationSource` / `SnapshotSink` interfaces and `MemoryStore`
//! - `snapshot_index` - R-tree over cluster bounds for viewport queries
//! - `credentials` - Device credential verification behind a decaying cache

pub mod credentials;
pub mod snapshot_index;
pub mod store;

pub use credentials::{CredentialAuthority, CredentialVerifier};
pub use snapshot_index::{ClusterBounds, SnapshotIndex};
pub use store::{
    DeviceId, MemoryStore, NotificationOrder, NotificationSource, SnapshotId, SnapshotSink,
    StoredNotification,
};

use std::collections::BTreeSet;

use log::{info, warn};

use crate::config::{EngineConfig, HullFailurePolicy};
use crate::dbscan::Dbscan;
use crate::error::{HotspotError, Result};
use crate::geo_utils::compute_bounds;
use crate::neighbors::NeighborFinder;
use crate::trace::trace_cluster;
use crate::{ClusterRecord, GpsPoint, NotificationPoint, Polygon, Snapshot};

/// Batch clustering over report snapshots.
///
/// Configuration is validated once and frozen for the lifetime of the engine.
#[derive(Debug, Clone)]
pub struct ClusteringEngine {
    config: EngineConfig,
}

impl ClusteringEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Cluster `points` as observed at `date`.
    ///
    /// Returns `Ok(None)` when no cluster forms. Labeling is sequential;
    /// tracing fans out per cluster when the `parallel` feature is enabled.
    pub fn run(&self, points: &[NotificationPoint], date: i64) -> Result<Option<Snapshot>> {
        info!("[Clustering] Found {} relevant nodes for clustering", points.len());

        let clustering = &self.config.clustering;
        let dbscan = Dbscan::new(NeighborFinder::from_config(clustering), clustering.min_points);
        let result = dbscan.run(points);

        info!(
            "[Clustering] Built {} clusters ({} noise points)",
            result.cluster_count,
            result.noise().len()
        );

        let groups: Vec<(u32, Vec<&NotificationPoint>)> = result
            .members()
            .into_iter()
            .map(|(id, indices)| (id, indices.into_iter().map(|i| &points[i]).collect()))
            .collect();

        if groups.is_empty() {
            return Ok(None);
        }

        #[cfg(feature = "parallel")]
        let records: Result<Vec<ClusterRecord>> = {
            use rayon::prelude::*;
            groups
                .par_iter()
                .map(|(id, members)| self.build_record(*id, members))
                .collect()
        };

        #[cfg(not(feature = "parallel"))]
        let records: Result<Vec<ClusterRecord>> = groups
            .iter()
            .map(|(id, members)| self.build_record(*id, members))
            .collect();

        let clusters = records?;
        info!("[Clustering] Finished clustering: {} clusters traced", clusters.len());

        Ok(Some(Snapshot { date, clusters }))
    }

    /// Load, cluster and commit in one batch.
    ///
    /// Nothing is committed when no cluster forms or when the run fails.
    pub fn run_with_store<S, K>(&self, source: &S, sink: &K, date: i64) -> Result<Option<SnapshotId>>
    where
        S: NotificationSource + ?Sized,
        K: SnapshotSink + ?Sized,
    {
        let points = source.relevant_points(date, self.config.relevance_window_secs())?;
        match self.run(&points, date)? {
            Some(snapshot) => sink.commit(snapshot).map(Some),
            None => Ok(None),
        }
    }

    fn build_record(&self, cluster_id: u32, members: &[&NotificationPoint]) -> Result<ClusterRecord> {
        let positions: Vec<GpsPoint> = members.iter().map(|n| n.position).collect();
        let bounds = compute_bounds(&positions);
        let polygon = apply_hull_policy(
            self.config.clustering.hull_failure,
            cluster_id,
            trace_cluster(&positions, self.config.clustering.alpha),
        )?;

        let kinds: BTreeSet<&str> = members.iter().map(|n| n.kind.as_str()).collect();

        Ok(ClusterRecord {
            cluster_id,
            north: bounds.max_lat,
            south: bounds.min_lat,
            east: bounds.max_lng,
            west: bounds.min_lng,
            count: members.len(),
            kinds: kinds.into_iter().map(str::to_string).collect(),
            notification_ids: members.iter().map(|n| n.id.clone()).collect(),
            polygon,
        })
    }
}

/// Resolve a cluster's trace outcome into the polygon to persist.
///
/// Degenerate clusters get an empty polygon. Malformed hulls follow
/// `policy`; any other error is returned as is.
pub fn apply_hull_policy(
    policy: HullFailurePolicy,
    cluster_id: u32,
    traced: Result<Option<Polygon>>,
) -> Result<Polygon> {
    match traced {
        Ok(polygon) => Ok(polygon.unwrap_or_default()),
        Err(e @ HotspotError::MalformedHull { .. }) => match policy {
            HullFailurePolicy::SkipPolygon => {
                warn!("[Clustering] Cluster {}: {}, skipping polygon", cluster_id, e);
                Ok(Polygon::default())
            }
            HullFailurePolicy::AbortRun => Err(e),
        },
        Err(e) => Err(e),
    }
}
