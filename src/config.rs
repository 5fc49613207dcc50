//! Engine configuration.
//!
//! Every section has a `Default` matching the production settings. A full
//! [`EngineConfig`] can be loaded from a JSON file named by the `CONFIG`
//! environment variable and then overridden by inline JSON given in
//! `CONFIG_INLINE`; missing keys fall back to their defaults.

use std::path::Path;
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{HotspotError, Result};

/// Environment variable naming the JSON configuration file.
pub const CONFIG_PATH_ENV: &str = "CONFIG";
/// Environment variable holding an inline JSON configuration object.
pub const CONFIG_INLINE_ENV: &str = "CONFIG_INLINE";

/// What to do when a cluster's hull cannot be assembled into closed rings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HullFailurePolicy {
    /// Keep the cluster but emit an empty ring list for it.
    #[default]
    SkipPolygon,
    /// Fail the whole clustering run.
    AbortRun,
}

/// Parameters of the DBSCAN pass and the boundary tracer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Minimum neighbors for a point to seed or extend a cluster.
    /// Default: 4
    pub min_points: usize,

    /// Maximum great-circle distance between neighbors, in meters.
    /// Default: 120.0
    pub max_distance: f64,

    /// Coarse triangulation-vector threshold used to cull candidates, in
    /// meters. Never applied below `max_distance`.
    /// Default: 2000.0
    pub triangulation_threshold: f64,

    /// Alpha-shape parameter over the unit-square projection. Triangles with
    /// circumradius of at least `1 / alpha` are dropped; 0 yields the convex hull.
    /// Default: 12.0
    pub alpha: f64,

    /// Behaviour on malformed hull edges.
    /// Default: skip the polygon
    pub hull_failure: HullFailurePolicy,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            min_points: 4,
            max_distance: 120.0,
            triangulation_threshold: 2000.0,
            alpha: 12.0,
            hull_failure: HullFailurePolicy::SkipPolygon,
        }
    }
}

/// Parameters of the vote-smoothing score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Reactions needed before observed votes count at all.
    /// Default: 4
    pub minimum_votes: u32,

    /// Prior like ratio in [0, 1].
    /// Default: 0.56 (5 likes for every 4 dislikes)
    pub mean: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            minimum_votes: 4,
            mean: 0.56,
        }
    }
}

/// Limits of the credential cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Reads allowed per cached credential.
    /// Default: 100
    pub max_count: u32,

    /// Maximum age of a cached credential, in seconds.
    /// Default: 2 days
    pub max_age_secs: u64,
}

impl CacheConfig {
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_count: 100,
            max_age_secs: 2 * 24 * 60 * 60,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub clustering: ClusteringConfig,
    pub scoring: ScoringConfig,
    pub device_cache: CacheConfig,

    /// How long a report stays live after its relevance timestamp, in minutes.
    /// Default: 90
    pub relevance_window_minutes: i64,

    /// Minimum time between two reports of the same device, in minutes.
    /// Default: 5
    pub waiting_interval_minutes: i64,

    /// Upper bound on rows returned by list queries.
    /// Default: 1000
    pub query_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            clustering: ClusteringConfig::default(),
            scoring: ScoringConfig::default(),
            device_cache: CacheConfig::default(),
            relevance_window_minutes: 90,
            waiting_interval_minutes: 5,
            query_limit: 1000,
        }
    }
}

impl EngineConfig {
    /// Relevance window in seconds.
    pub fn relevance_window_secs(&self) -> i64 {
        self.relevance_window_minutes * 60
    }

    /// Waiting interval in seconds.
    pub fn waiting_interval_secs(&self) -> i64 {
        self.waiting_interval_minutes * 60
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        let c = &self.clustering;
        if c.min_points == 0 {
            return Err(invalid("clustering.min_points must be at least 1"));
        }
        if !(c.max_distance.is_finite() && c.max_distance > 0.0) {
            return Err(invalid("clustering.max_distance must be positive"));
        }
        if !(c.triangulation_threshold.is_finite() && c.triangulation_threshold >= 0.0) {
            return Err(invalid("clustering.triangulation_threshold must be non-negative"));
        }
        if !(c.alpha.is_finite() && c.alpha >= 0.0) {
            return Err(invalid("clustering.alpha must be non-negative"));
        }
        if !(0.0..=1.0).contains(&self.scoring.mean) {
            return Err(invalid("scoring.mean must lie in [0, 1]"));
        }
        if self.relevance_window_minutes <= 0 {
            return Err(invalid("relevance_window_minutes must be positive"));
        }
        if self.waiting_interval_minutes < 0 {
            return Err(invalid("waiting_interval_minutes must be non-negative"));
        }
        if self.query_limit == 0 {
            return Err(invalid("query_limit must be at least 1"));
        }
        if self.device_cache.max_count == 0 {
            return Err(invalid("device_cache.max_count must be at least 1"));
        }
        Ok(())
    }

    /// Parse a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Build the configuration from the process environment.
    ///
    /// Defaults, then the file named by `CONFIG`, then `CONFIG_INLINE`.
    /// An unreadable file or invalid inline JSON is logged and ignored.
    pub fn from_env() -> Result<Self> {
        let file = std::env::var(CONFIG_PATH_ENV).ok();
        let inline = std::env::var(CONFIG_INLINE_ENV).ok();
        Self::from_sources(file.as_deref().map(Path::new), inline.as_deref())
    }

    /// Merge defaults with an optional file and optional inline JSON object.
    pub fn from_sources(file: Option<&Path>, inline: Option<&str>) -> Result<Self> {
        let mut merged = serde_json::to_value(Self::default())?;

        match file {
            Some(path) => match std::fs::read_to_string(path)
                .map_err(HotspotError::from)
                .and_then(|text| serde_json::from_str::<Value>(&text).map_err(HotspotError::from))
            {
                Ok(value) => {
                    info!("Using '{}' as configuration file", path.display());
                    merge_json(&mut merged, value);
                }
                Err(e) => warn!("Ignoring configuration file '{}': {}", path.display(), e),
            },
            None => info!("No external configuration file given"),
        }

        if let Some(text) = inline {
            match serde_json::from_str::<Value>(text) {
                Ok(value @ Value::Object(_)) => {
                    info!("Using given inline configuration");
                    merge_json(&mut merged, value);
                }
                _ => warn!("Inline configuration given was invalid"),
            }
        }

        let config: Self = serde_json::from_value(merged)?;
        config.validate()?;
        Ok(config)
    }
}

fn invalid(msg: &str) -> HotspotError {
    HotspotError::InvalidConfig(msg.to_string())
}

/// Recursively overlay `overlay` onto `base`; objects merge, everything else replaces.
fn merge_json(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
