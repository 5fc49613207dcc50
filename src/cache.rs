//! A decaying key/value cache with two independent expiry axes.
//!
//! Entries expire when older than `max_age` or once their read budget of
//! `max_count` is spent. Expiry is lazy: `get` sweeps out aged entries before
//! every lookup, `has` checks only the requested key. Each call holds the
//! cache lock for its whole duration.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::config::CacheConfig;

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.offset.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Debug)]
struct Entry<V> {
    value: V,
    created: Instant,
    reads: u32,
}

/// Cache whose entries decay by age and by number of reads.
pub struct DecayingCache<K, V> {
    max_count: u32,
    max_age: Duration,
    clock: Arc<dyn Clock>,
    store: Mutex<HashMap<K, Entry<V>>>,
}

impl<K, V> std::fmt::Debug for DecayingCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecayingCache")
            .field("max_count", &self.max_count)
            .field("max_age", &self.max_age)
            .finish_non_exhaustive()
    }
}

impl<K: Eq + Hash, V: Clone> DecayingCache<K, V> {
    /// Create a cache on the wall clock.
    pub fn new(max_count: u32, max_age: Duration) -> Self {
        Self::with_clock(max_count, max_age, Arc::new(SystemClock))
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_count, config.max_age())
    }

    pub fn with_clock(max_count: u32, max_age: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            max_count,
            max_age,
            clock,
            store: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, Entry<V>>> {
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn expired(&self, entry: &Entry<V>, now: Instant) -> bool {
        now.saturating_duration_since(entry.created) > self.max_age
    }

    /// Store `value`, resetting age and read count.
    pub fn set(&self, key: K, value: V) {
        let created = self.clock.now();
        self.lock().insert(
            key,
            Entry {
                value,
                created,
                reads: 0,
            },
        );
    }

    /// Read a value, spending one unit of its read budget.
    ///
    /// The read that exhausts the budget evicts the entry but still returns
    /// the value.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut store = self.lock();
        store.retain(|_, entry| !self.expired(entry, now));

        let entry = store.get_mut(key)?;
        if entry.reads >= self.max_count {
            store.remove(key);
            return None;
        }
        entry.reads += 1;
        if entry.reads == self.max_count {
            return store.remove(key).map(|e| e.value);
        }
        Some(entry.value.clone())
    }

    /// Whether `key` is present and not aged out. Does not spend a read.
    pub fn has(&self, key: &K) -> bool {
        let now = self.clock.now();
        let mut store = self.lock();
        match store.get(key) {
            Some(entry) if self.expired(entry, now) => {
                store.remove(key);
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    /// Remove `key` unconditionally.
    pub fn expire(&self, key: &K) {
        self.lock().remove(key);
    }

    /// Number of stored entries, including ones not yet swept.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manual(max_count: u32, max_age: Duration) -> (Arc<ManualClock>, DecayingCache<&'static str, u32>) {
        let clock = Arc::new(ManualClock::new());
        let cache = DecayingCache::with_clock(max_count, max_age, clock.clone());
        (clock, cache)
    }

    #[test]
    fn test_read_budget() {
        let (_, cache) = manual(5, Duration::from_secs(60));
        cache.set("a", 7);
        for _ in 0..5 {
            assert_eq!(cache.get(&"a"), Some(7));
        }
        assert!(cache.is_empty());
        assert_eq!(cache.get(&"a"), None);
    }

    #[test]
    fn test_set_resets_budget() {
        let (_, cache) = manual(2, Duration::from_secs(60));
        cache.set("a", 1);
        cache.get(&"a");
        cache.set("a", 2);
        assert_eq!(cache.get(&"a"), Some(2));
        assert_eq!(cache.get(&"a"), Some(2));
        assert_eq!(cache.get(&"a"), None);
    }

    #[test]
    fn test_age_expiry_on_get_sweeps_all() {
        let (clock, cache) = manual(5, Duration::from_millis(100));
        cache.set("a", 1);
        cache.set("b", 2);
        clock.advance(Duration::from_millis(101));
        assert_eq!(cache.get(&"a"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_has_does_not_spend_reads() {
        let (clock, cache) = manual(1, Duration::from_secs(10));
        cache.set("a", 1);
        assert!(cache.has(&"a"));
        assert!(cache.has(&"a"));
        assert_eq!(cache.get(&"a"), Some(1));
        assert!(!cache.has(&"a"));

        cache.set("b", 2);
        clock.advance(Duration::from_secs(11));
        assert!(!cache.has(&"b"));
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_expire() {
        let (_, cache) = manual(3, Duration::from_secs(10));
        cache.set("a", 1);
        cache.expire(&"a");
        assert_eq!(cache.get(&"a"), None);
    }
}
