// ── Viewport result cache ──
//
// Short-lived memo of synchronization results keyed by query. Entries
// expire after a fixed TTL; when full, the oldest insertion is evicted.
// Any successful mutation clears the whole cache.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use indexmap::IndexMap;
use tokio::time::Instant;
use tracing::debug;

use crate::query::QueryKey;
use crate::store::TopologySnapshot;

#[derive(Debug, Clone)]
struct CacheEntry {
    inserted_at: Instant,
    snapshot: Arc<TopologySnapshot>,
}

pub struct DataSyncCache {
    ttl: Duration,
    capacity: usize,
    entries: Mutex<IndexMap<QueryKey, CacheEntry>>,
}

impl DataSyncCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
            entries: Mutex::new(IndexMap::new()),
        }
    }

    /// The cached snapshot for `key`, if it was stored no more than one
    /// TTL ago. Expired entries are dropped on the way out.
    pub fn get(&self, key: &QueryKey) -> Option<Arc<TopologySnapshot>> {
        let mut entries = self.lock();
        let entry = entries.get(key)?;
        if entry.inserted_at.elapsed() <= self.ttl {
            return Some(Arc::clone(&entry.snapshot));
        }
        entries.shift_remove(key);
        debug!("cache entry expired");
        None
    }

    /// Store `snapshot` under `key`. Overwriting moves the key to the back
    /// of the eviction order.
    pub fn set(&self, key: QueryKey, snapshot: Arc<TopologySnapshot>) {
        let mut entries = self.lock();
        entries.shift_remove(&key);
        entries.insert(
            key,
            CacheEntry {
                inserted_at: Instant::now(),
                snapshot,
            },
        );
        while entries.len() > self.capacity {
            entries.shift_remove_index(0);
            debug!(capacity = self.capacity, "evicted oldest cache entry");
        }
    }

    pub fn invalidate_all(&self) {
        let mut entries = self.lock();
        if !entries.is_empty() {
            debug!(entries = entries.len(), "invalidating viewport cache");
        }
        entries.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, IndexMap<QueryKey, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
