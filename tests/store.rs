//! Tests for the in-memory store and credential verification

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use hotspot::engine::NotificationOrder;
use hotspot::synthetic::offset;
use hotspot::{
    Bounds, CacheConfig, ClusteringEngine, CredentialAuthority, CredentialVerifier, EngineConfig,
    GpsPoint, HotspotError, MemoryStore, ScoringModel,
};

const NOW: i64 = 1_700_000_000;

fn viewport(south: f64, west: f64, north: f64, east: f64) -> Bounds {
    Bounds {
        min_lat: south,
        max_lat: north,
        min_lng: west,
        max_lng: east,
    }
}

fn store_with_report() -> (MemoryStore, String, String) {
    let store = MemoryStore::new(EngineConfig::default());
    let owner = store.register_device();
    let report = store
        .create_notification(&owner, 45.07, 7.68, "ACC", Some("crash"), NOW)
        .unwrap();
    (store, owner, report.point.id)
}

#[test]
fn test_create_notification_defaults() {
    let (store, owner, id) = store_with_report();
    let stored = store.notification(&id).unwrap();

    assert_eq!(stored.device_id, owner);
    assert_eq!(stored.point.kind, "acc");
    assert_eq!(stored.comment.as_deref(), Some("crash"));
    assert_eq!((stored.likes, stored.dislikes), (0, 0));
    assert_eq!(stored.score, ScoringModel::new(4, 0.56).prior());
    assert_eq!(stored.relevant_at, NOW);
}

#[test]
fn test_create_notification_validation() {
    let store = MemoryStore::new(EngineConfig::default());
    let device = store.register_device();

    let bad = [
        store.create_notification(&device, 91.0, 7.0, "acc", None, NOW),
        store.create_notification(&device, 45.0, f64::NAN, "acc", None, NOW),
        store.create_notification(&device, 45.0, 7.0, "", None, NOW),
        store.create_notification(&device, 45.0, 7.0, "accident", None, NOW),
    ];
    assert!(bad
        .iter()
        .all(|r| matches!(r, Err(HotspotError::BadParameters(_)))));

    assert!(matches!(
        store.create_notification("device-missing", 45.0, 7.0, "acc", None, NOW),
        Err(HotspotError::NotFound { .. })
    ));
}

#[test]
fn test_waiting_interval_between_reports() {
    let store = MemoryStore::new(EngineConfig::default());
    let device = store.register_device();
    let interval = EngineConfig::default().waiting_interval_secs();

    store.create_notification(&device, 45.0, 7.0, "acc", None, NOW).unwrap();
    let err = store
        .create_notification(&device, 45.0, 7.0, "acc", None, NOW + interval)
        .unwrap_err();
    assert!(matches!(err, HotspotError::BadParameters(ref m) if m.contains("wait")));

    store
        .create_notification(&device, 45.0, 7.0, "acc", None, NOW + interval + 1)
        .unwrap();
}

#[test]
fn test_rating_updates_score_and_relevance() {
    let (store, _, id) = store_with_report();
    let model = ScoringModel::new(4, 0.56);

    let mut last = None;
    for i in 0..5 {
        let voter = store.register_device();
        last = Some(store.rate(&id, &voter, i != 2, NOW + 100 + i).unwrap());
    }
    let last = last.unwrap();
    let stored = store.notification(&id).unwrap();

    assert_eq!((stored.likes, stored.dislikes), (4, 1));
    assert_eq!(stored.score, model.score(4, 5));
    assert_eq!(last.score, stored.score);
    // Latest positive reaction was the fifth one
    assert_eq!(stored.relevant_at, NOW + 104);
}

#[test]
fn test_rerating_replaces_reaction() {
    let (store, _, id) = store_with_report();
    let voter = store.register_device();

    store.rate(&id, &voter, true, NOW + 10).unwrap();
    store.rate(&id, &voter, false, NOW + 20).unwrap();
    let stored = store.notification(&id).unwrap();
    assert_eq!((stored.likes, stored.dislikes), (0, 1));
    assert_eq!(stored.relevant_at, NOW);
}

#[test]
fn test_owner_cannot_rate() {
    let (store, owner, id) = store_with_report();
    let err = store.rate(&id, &owner, true, NOW + 1).unwrap_err();
    assert!(matches!(err, HotspotError::BadParameters(ref m) if m.contains("owned")));
}

#[test]
fn test_rating_after_window_is_not_found() {
    let (store, _, id) = store_with_report();
    let voter = store.register_device();
    let window = EngineConfig::default().relevance_window_secs();

    // Grace minute past the window still accepted, up to and including its last second
    store.rate(&id, &voter, false, NOW + window + 30).unwrap();
    store.rate(&id, &voter, false, NOW + window + 60).unwrap();
    let err = store.rate(&id, &voter, true, NOW + window + 61).unwrap_err();
    assert!(matches!(err, HotspotError::NotFound { .. }));
    assert!(matches!(
        store.rate("notification-missing", &voter, true, NOW),
        Err(HotspotError::NotFound { .. })
    ));
}

#[test]
fn test_concurrent_reactions_consistent() {
    let (store, _, id) = store_with_report();
    let store = Arc::new(store);
    let voters: Vec<String> = (0..32).map(|_| store.register_device()).collect();

    let handles: Vec<_> = voters
        .into_iter()
        .enumerate()
        .map(|(i, voter)| {
            let store = Arc::clone(&store);
            let id = id.clone();
            thread::spawn(move || store.rate(&id, &voter, i % 4 != 0, NOW + 1).unwrap())
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let stored = store.notification(&id).unwrap();
    assert_eq!((stored.likes, stored.dislikes), (24, 8));
    assert_eq!(stored.score, ScoringModel::new(4, 0.56).score(24, 32));
}

#[test]
fn test_notifications_in_viewport_and_order() {
    let store = MemoryStore::new(EngineConfig::default());
    let inside = [(45.01, 7.01, "acc"), (45.02, 7.02, "jam"), (45.03, 7.03, "acc")];
    let mut ids = Vec::new();
    for (i, (lat, lng, kind)) in inside.iter().enumerate() {
        let device = store.register_device();
        let n = store
            .create_notification(&device, *lat, *lng, kind, None, NOW + i as i64)
            .unwrap();
        ids.push(n.point.id);
    }
    let device = store.register_device();
    store.create_notification(&device, 46.5, 7.5, "acc", None, NOW).unwrap();

    let view = viewport(45.0, 7.0, 45.1, 7.1);
    let date = NOW + 10;

    let by_date = store.notifications_in(&view, None, date, NotificationOrder::Date, None);
    let listed: Vec<&str> = by_date.iter().map(|n| n.point.id.as_str()).collect();
    assert_eq!(listed, vec![ids[2].as_str(), ids[1].as_str(), ids[0].as_str()]);

    let accidents = store.notifications_in(&view, Some("ACC"), date, NotificationOrder::Date, Some(1));
    assert_eq!(accidents.len(), 1);
    assert_eq!(accidents[0].point.id, ids[2]);

    // Four likes on the oldest report lift it to the top
    for _ in 0..4 {
        let voter = store.register_device();
        store.rate(&ids[0], &voter, true, NOW + 5).unwrap();
    }
    let by_score = store.notifications_in(&view, None, date, NotificationOrder::Score, None);
    assert_eq!(by_score[0].point.id, ids[0]);

    // Nothing is live once the window has passed
    let later = NOW + 5 + EngineConfig::default().relevance_window_secs();
    assert!(store
        .notifications_in(&view, None, later, NotificationOrder::Date, None)
        .is_empty());
}

#[test]
fn test_snapshot_queries() {
    let mut config = EngineConfig::default();
    config.clustering.min_points = 3;
    config.clustering.alpha = 1.0;
    let store = MemoryStore::new(config.clone());
    let origin = GpsPoint::new(45.07, 7.68);

    // A 6-report group and a 4-report group 2 km apart
    let layout: Vec<(f64, f64)> = [(0.0, 0.0), (30.0, 0.0), (30.0, 30.0), (0.0, 30.0), (15.0, 45.0), (15.0, 15.0)]
        .into_iter()
        .chain([(2000.0, 0.0), (2030.0, 0.0), (2030.0, 30.0), (2000.0, 30.0)])
        .collect();
    for (east, north) in &layout {
        let device = store.register_device();
        let p = offset(&origin, *east, *north);
        store
            .create_notification(&device, p.latitude, p.longitude, "acc", None, NOW)
            .unwrap();
    }

    let engine = ClusteringEngine::new(config).unwrap();
    let id = engine.run_with_store(&store, &store, NOW + 60).unwrap().unwrap();

    let everywhere = viewport(44.0, 7.0, 46.0, 8.0);
    let clusters = store.snapshot_clusters(id, &everywhere).unwrap();
    assert_eq!(clusters.len(), 2);
    assert_eq!(clusters[0].count, 6);
    assert_eq!(clusters[1].count, 4);

    // Viewport around the eastern group only
    let east_corner = offset(&origin, 1900.0, -100.0);
    let east_view = viewport(east_corner.latitude, east_corner.longitude, 45.2, 8.0);
    let clusters = store.snapshot_clusters(id, &east_view).unwrap();
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].count, 4);

    assert!(store.snapshots_between(NOW + 61, NOW + 1000).is_empty());
    assert!(matches!(
        store.snapshot_clusters(id + 100, &everywhere),
        Err(HotspotError::NotFound { .. })
    ));
}

struct CountingAuthority {
    calls: AtomicUsize,
}

impl CredentialAuthority for CountingAuthority {
    fn verify(&self, device_id: &str, secret: &str) -> hotspot::Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(secret == format!("{}-secret", device_id))
    }
}

fn verifier(max_count: u32) -> CredentialVerifier<CountingAuthority> {
    let authority = CountingAuthority {
        calls: AtomicUsize::new(0),
    };
    let config = CacheConfig {
        max_count,
        max_age_secs: 3600,
    };
    CredentialVerifier::new(authority, &config)
}

#[test]
fn test_verified_secret_served_from_cache() {
    let verifier = verifier(3);
    verifier.verify("d1", "d1-secret").unwrap();
    verifier.verify("d1", "d1-secret").unwrap();
    verifier.verify("d1", "d1-secret").unwrap();
    assert_eq!(verifier.authority().calls.load(Ordering::SeqCst), 1);

    // Read budget spent: third cached check evicted the entry
    verifier.verify("d1", "d1-secret").unwrap();
    verifier.verify("d1", "d1-secret").unwrap();
    assert_eq!(verifier.authority().calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_wrong_secret_rejected() {
    let verifier = verifier(10);
    assert!(matches!(
        verifier.verify("d1", "guess"),
        Err(HotspotError::NotAuthorized(_))
    ));

    verifier.verify("d1", "d1-secret").unwrap();
    // Mismatch against the cached secret never reaches the authority
    assert!(matches!(
        verifier.verify("d1", "guess"),
        Err(HotspotError::NotAuthorized(_))
    ));
    assert_eq!(verifier.authority().calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_forget_forces_authority() {
    let verifier = verifier(10);
    verifier.verify("d1", "d1-secret").unwrap();
    verifier.forget("d1");
    verifier.verify("d1", "d1-secret").unwrap();
    assert_eq!(verifier.authority().calls.load(Ordering::SeqCst), 2);
}
