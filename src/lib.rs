//! # Hotspot
//!
//! Clustering of geotagged reports into concave regions, with vote-based
//! relevance scoring.
//!
//! This library provides:
//! - Fixed-radius neighbor search with a triangulation-vector pre-filter
//! - DBSCAN over points on the sphere
//! - Local planar projection and alpha-shape boundary tracing
//! - A smoothed report score and a decaying "still relevant" timestamp
//! - A decaying cache (age + read count) for credential checks
//! - A clustering engine with store interfaces and an in-memory store
//!
//! ## Features
//!
//! - **`parallel`** - Trace clusters in parallel with rayon (default)
//! - **`synthetic`** - Seeded synthetic report clouds for tests and benchmarks
//!
//! ## Quick Start
//!
//! ```rust
//! use hotspot::{ClusteringEngine, EngineConfig, NotificationPoint};
//!
//! let mut config = EngineConfig::default();
//! config.clustering.min_points = 3;
//!
//! let points: Vec<NotificationPoint> = (0..6)
//!     .map(|i| {
//!         let lat = 45.0700 + (i / 3) as f64 * 0.0004;
//!         let lng = 7.6800 + (i % 3) as f64 * 0.0004;
//!         NotificationPoint::new(&format!("n{}", i), lat, lng, "acc", 0)
//!     })
//!     .collect();
//!
//! let engine = ClusteringEngine::new(config).unwrap();
//! let snapshot = engine.run(&points, 0).unwrap().expect("one cluster");
//! assert_eq!(snapshot.clusters.len(), 1);
//! assert_eq!(snapshot.clusters[0].count, 6);
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{HotspotError, OptionExt, Result};

// Configuration and its loaders
pub mod config;
pub use config::{CacheConfig, ClusteringConfig, EngineConfig, HullFailurePolicy, ScoringConfig};

// Geographic utilities (distance, bounds, antimeridian)
pub mod geo_utils;

// Distance-to-anchor vectors used to cull neighbor candidates
pub mod triangulation;
pub use triangulation::TriangulationVector;

// Neighbor search and density clustering
pub mod dbscan;
pub mod neighbors;
pub use dbscan::{Dbscan, DbscanResult, Label};
pub use neighbors::NeighborFinder;

// Outline tracing: projection, alpha shape, ring assembly
pub mod alpha_shape;
pub mod projection;
pub mod trace;
pub use trace::{assemble_rings, trace_cluster, Polygon, Ring};

// Report scoring and relevance
pub mod scoring;
pub use scoring::{ReactionTally, ReportScore, ScoringModel};

// Decaying cache
pub mod cache;
pub use cache::{Clock, DecayingCache, ManualClock, SystemClock};

// Clustering runs, store interfaces, in-memory store, credentials
pub mod engine;
pub use engine::{
    ClusteringEngine, CredentialAuthority, CredentialVerifier, MemoryStore, NotificationSource,
    SnapshotSink,
};

// Synthetic report clouds for tests and benchmarks
#[cfg(feature = "synthetic")]
pub mod synthetic;

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Create bounds from GPS points.
    pub fn from_points(points: &[GpsPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut min_lat = f64::MAX;
        let mut max_lat = f64::MIN;
        let mut min_lng = f64::MAX;
        let mut max_lng = f64::MIN;

        for p in points {
            min_lat = min_lat.min(p.latitude);
            max_lat = max_lat.max(p.latitude);
            min_lng = min_lng.min(p.longitude);
            max_lng = max_lng.max(p.longitude);
        }

        Some(Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        })
    }

    /// Get the center point of the bounds.
    pub fn center(&self) -> GpsPoint {
        GpsPoint::new(
            self.min_lat + (self.max_lat - self.min_lat) / 2.0,
            self.min_lng + (self.max_lng - self.min_lng) / 2.0,
        )
    }

    /// Whether a point lies inside the bounds (edges included).
    pub fn contains(&self, p: &GpsPoint) -> bool {
        p.latitude >= self.min_lat
            && p.latitude <= self.max_lat
            && p.longitude >= self.min_lng
            && p.longitude <= self.max_lng
    }
}

/// A report as seen by one clustering run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPoint {
    pub id: String,
    pub position: GpsPoint,
    pub triangulation: TriangulationVector,
    /// Short kind tag (e.g. "acc" for an accident).
    pub kind: String,
    /// Unix seconds.
    pub created_at: i64,
}

impl NotificationPoint {
    /// Create a point, computing its triangulation vector.
    pub fn new(id: &str, latitude: f64, longitude: f64, kind: &str, created_at: i64) -> Self {
        let position = GpsPoint::new(latitude, longitude);
        Self {
            id: id.to_string(),
            position,
            triangulation: TriangulationVector::from_point(&position),
            kind: kind.to_string(),
            created_at,
        }
    }
}

/// One cluster of a snapshot, ready for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterRecord {
    /// Run-local cluster id (>= 1).
    pub cluster_id: u32,
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
    /// Number of member reports.
    pub count: usize,
    /// Distinct kind tags, sorted.
    pub kinds: Vec<String>,
    /// Member report ids, in input order.
    pub notification_ids: Vec<String>,
    /// Outline; empty for degenerate clusters or skipped hulls.
    pub polygon: Polygon,
}

impl ClusterRecord {
    pub fn bounds(&self) -> Bounds {
        Bounds {
            min_lat: self.south,
            max_lat: self.north,
            min_lng: self.west,
            max_lng: self.east,
        }
    }
}

/// Result of one clustering run. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Target date of the run, unix seconds.
    pub date: i64,
    pub clusters: Vec<ClusterRecord>,
}
