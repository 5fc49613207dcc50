//! Store interfaces consumed by the engine and an in-memory implementation.
//!
//! The engine only needs two things from persistence: one bulk fetch of the
//! points relevant at a date, and one bulk commit of a finished snapshot.
//! [`MemoryStore`] implements both, plus the report lifecycle around them
//! (devices, reports, reactions, snapshot queries).

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use log::debug;
use serde::Serialize;

use crate::config::EngineConfig;
use crate::error::{HotspotError, OptionExt, Result};
use crate::scoring::{is_live, Reaction, ReactionTally, ReportScore, ScoringModel};
use crate::{Bounds, ClusterRecord, NotificationPoint, Snapshot};

use super::snapshot_index::SnapshotIndex;

pub type DeviceId = String;
pub type SnapshotId = u64;

/// Grace period added to the relevance window when accepting reactions.
const RATING_GRACE_SECS: i64 = 60;

/// Bulk source of report points for a clustering run.
pub trait NotificationSource {
    /// Points created at or before `date` and still live at `date`.
    fn relevant_points(&self, date: i64, window_secs: i64) -> Result<Vec<NotificationPoint>>;
}

/// All-or-nothing sink for finished snapshots.
pub trait SnapshotSink {
    fn commit(&self, snapshot: Snapshot) -> Result<SnapshotId>;
}

/// A report together with its reaction state.
#[derive(Debug, Clone, Serialize)]
pub struct StoredNotification {
    #[serde(flatten)]
    pub point: NotificationPoint,
    pub device_id: DeviceId,
    pub comment: Option<String>,
    pub likes: u32,
    pub dislikes: u32,
    pub score: f64,
    /// Unix seconds.
    pub relevant_at: i64,
    #[serde(skip)]
    reactions: HashMap<DeviceId, Reaction>,
}

/// Sort order for report listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationOrder {
    /// Newest first.
    #[default]
    Date,
    /// Highest score first, then newest.
    Score,
}

/// Listing entry for a committed snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotSummary {
    pub id: SnapshotId,
    pub date: i64,
    pub cluster_count: usize,
}

#[derive(Debug)]
struct DeviceRecord {
    last_notification: Option<i64>,
}

#[derive(Debug)]
struct StoredSnapshot {
    id: SnapshotId,
    snapshot: Snapshot,
    index: SnapshotIndex,
}

/// In-memory store. Reactions on one report are serialized by a per-report
/// lock; different reports are updated concurrently.
#[derive(Debug)]
pub struct MemoryStore {
    config: EngineConfig,
    scoring: ScoringModel,
    next_id: AtomicU64,
    devices: Mutex<HashMap<DeviceId, DeviceRecord>>,
    notifications: RwLock<BTreeMap<String, Arc<Mutex<StoredNotification>>>>,
    snapshots: RwLock<Vec<StoredSnapshot>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl MemoryStore {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            scoring: ScoringModel::from_config(&config.scoring),
            config,
            next_id: AtomicU64::new(1),
            devices: Mutex::new(HashMap::new()),
            notifications: RwLock::new(BTreeMap::new()),
            snapshots: RwLock::new(Vec::new()),
        }
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn limit(&self, count: Option<usize>) -> usize {
        count.map_or(self.config.query_limit, |c| c.clamp(1, self.config.query_limit))
    }

    fn entry(&self, id: &str) -> Result<Arc<Mutex<StoredNotification>>> {
        self.notifications
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
            .ok_or_not_found("notification")
    }

    fn all_notifications(&self) -> Vec<Arc<Mutex<StoredNotification>>> {
        self.notifications
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect()
    }

    /// Register a new device and return its id.
    pub fn register_device(&self) -> DeviceId {
        let id = format!("device-{:08}", self.next_id());
        lock(&self.devices).insert(id.clone(), DeviceRecord { last_notification: None });
        id
    }

    /// File a new report for `device_id` at `now`.
    ///
    /// A device must wait the configured interval between two reports.
    pub fn create_notification(
        &self,
        device_id: &str,
        latitude: f64,
        longitude: f64,
        kind: &str,
        comment: Option<&str>,
        now: i64,
    ) -> Result<StoredNotification> {
        let point = NotificationPoint::new("", latitude, longitude, &kind.to_lowercase(), now);
        if !point.position.is_valid() {
            return Err(HotspotError::BadParameters("invalid coordinates".to_string()));
        }
        if kind.is_empty() || kind.len() > 3 {
            return Err(HotspotError::BadParameters("invalid notification kind".to_string()));
        }

        let mut devices = lock(&self.devices);
        let device = devices.get_mut(device_id).ok_or_not_found("device")?;
        if let Some(last) = device.last_notification {
            if last >= now - self.config.waiting_interval_secs() {
                return Err(HotspotError::BadParameters(
                    "device must wait to notify again".to_string(),
                ));
            }
        }

        let id = format!("notification-{:08}", self.next_id());
        let stored = StoredNotification {
            point: NotificationPoint { id: id.clone(), ..point },
            device_id: device_id.to_string(),
            comment: comment.map(str::to_string),
            likes: 0,
            dislikes: 0,
            score: self.scoring.prior(),
            relevant_at: now,
            reactions: HashMap::new(),
        };

        self.notifications
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, Arc::new(Mutex::new(stored.clone())));
        device.last_notification = Some(now);

        Ok(stored)
    }

    /// Record (or replace) `device_id`'s reaction to a report and write back
    /// its new score and relevance timestamp.
    pub fn rate(
        &self,
        notification_id: &str,
        device_id: &str,
        positive: bool,
        now: i64,
    ) -> Result<ReportScore> {
        let entry = self.entry(notification_id)?;
        let mut notification = lock(&entry);

        // Inclusive at the far edge of the grace period
        let window = self.config.relevance_window_secs() + RATING_GRACE_SECS;
        if now - notification.relevant_at > window {
            return Err(HotspotError::NotFound {
                entity: "notification".to_string(),
            });
        }
        if notification.device_id == device_id {
            return Err(HotspotError::BadParameters(
                "notification is owned by device".to_string(),
            ));
        }

        notification
            .reactions
            .insert(device_id.to_string(), Reaction { positive, date: now });

        let tally = ReactionTally::from_reactions(notification.reactions.values());
        let updated = self.scoring.recompute(notification.point.created_at, &tally);
        notification.likes = tally.likes;
        notification.dislikes = tally.dislikes;
        notification.score = updated.score;
        notification.relevant_at = updated.relevant_at;

        debug!(
            "[Store] {} rated {}: {}/{} likes, score {:.5}",
            notification_id,
            if positive { "up" } else { "down" },
            tally.likes,
            tally.total(),
            updated.score
        );
        Ok(updated)
    }

    pub fn notification(&self, id: &str) -> Result<StoredNotification> {
        let entry = self.entry(id)?;
        let notification = lock(&entry).clone();
        Ok(notification)
    }

    /// Live reports inside a viewport at `date`.
    pub fn notifications_in(
        &self,
        viewport: &Bounds,
        kind: Option<&str>,
        date: i64,
        order: NotificationOrder,
        count: Option<usize>,
    ) -> Vec<StoredNotification> {
        let window = self.config.relevance_window_secs();
        let kind = kind.map(str::to_lowercase);

        let mut found: Vec<StoredNotification> = self
            .all_notifications()
            .iter()
            .map(|entry| lock(entry).clone())
            .filter(|n| {
                viewport.contains(&n.point.position)
                    && n.point.created_at <= date
                    && is_live(n.relevant_at, date, window)
                    && kind.as_ref().map_or(true, |k| &n.point.kind == k)
            })
            .collect();

        match order {
            NotificationOrder::Date => {
                found.sort_by(|a, b| b.point.created_at.cmp(&a.point.created_at))
            }
            NotificationOrder::Score => found.sort_by(|a, b| {
                b.score
                    .total_cmp(&a.score)
                    .then(b.point.created_at.cmp(&a.point.created_at))
            }),
        }
        found.truncate(self.limit(count));
        found
    }

    /// Committed snapshots with `since <= date <= until`, newest first.
    pub fn snapshots_between(&self, since: i64, until: i64) -> Vec<SnapshotSummary> {
        let snapshots = self.snapshots.read().unwrap_or_else(|e| e.into_inner());
        let mut found: Vec<SnapshotSummary> = snapshots
            .iter()
            .filter(|s| s.snapshot.date >= since && s.snapshot.date <= until)
            .map(|s| SnapshotSummary {
                id: s.id,
                date: s.snapshot.date,
                cluster_count: s.snapshot.clusters.len(),
            })
            .collect();
        found.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        found.truncate(self.config.query_limit);
        found
    }

    /// Clusters of one snapshot intersecting a viewport, largest first.
    pub fn snapshot_clusters(&self, id: SnapshotId, viewport: &Bounds) -> Result<Vec<ClusterRecord>> {
        let snapshots = self.snapshots.read().unwrap_or_else(|e| e.into_inner());
        let stored = snapshots.iter().find(|s| s.id == id).ok_or_not_found("snapshot")?;

        let mut clusters: Vec<ClusterRecord> = stored
            .index
            .query_viewport(viewport)
            .into_iter()
            .map(|slot| stored.snapshot.clusters[slot].clone())
            .collect();
        clusters.sort_by(|a, b| b.count.cmp(&a.count));
        clusters.truncate(self.config.query_limit);
        Ok(clusters)
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl NotificationSource for MemoryStore {
    fn relevant_points(&self, date: i64, window_secs: i64) -> Result<Vec<NotificationPoint>> {
        Ok(self
            .all_notifications()
            .iter()
            .filter_map(|entry| {
                let n = lock(entry);
                (n.point.created_at <= date && is_live(n.relevant_at, date, window_secs))
                    .then(|| n.point.clone())
            })
            .collect())
    }
}

impl SnapshotSink for MemoryStore {
    fn commit(&self, snapshot: Snapshot) -> Result<SnapshotId> {
        if snapshot.clusters.is_empty() {
            return Err(HotspotError::BadParameters(
                "refusing to commit a snapshot without clusters".to_string(),
            ));
        }
        let id = self.next_id();
        let index = SnapshotIndex::build(&snapshot.clusters);
        self.snapshots
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(StoredSnapshot { id, snapshot, index });
        Ok(id)
    }
}
