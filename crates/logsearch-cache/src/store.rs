use std::time::Duration;

use ambari_core_types::CacheKey;
use dashmap::DashMap;
use parking_lot::RwLock;
use tokio::time::Instant;

#[derive(Clone, Debug)]
struct StoredEntry<V> {
    value: V,
    written_at: Instant,
}

impl<V> StoredEntry<V> {
    fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.written_at) < ttl
    }
}

/// Concurrent key/value store whose entries expire a fixed time after they were written.
///
/// Expired entries are dropped lazily on read and in bulk by [`ExpiringStore::purge_expired`].
/// The store also carries an epoch that [`ExpiringStore::invalidate_all`] advances, so writers
/// holding an older epoch cannot repopulate a store that was invalidated under them.
#[derive(Debug)]
pub struct ExpiringStore<V> {
    entries: DashMap<CacheKey, StoredEntry<V>>,
    ttl: Duration,
    epoch: RwLock<u64>,
}

impl<V: Clone> ExpiringStore<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            epoch: RwLock::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn epoch(&self) -> u64 {
        *self.epoch.read()
    }

    pub fn get(&self, key: &CacheKey) -> Option<V> {
        let now = Instant::now();
        match self.entries.get(key) {
            Some(entry) if entry.is_fresh(now, self.ttl) => return Some(entry.value.clone()),
            Some(_) => {}
            None => return None,
        }
        // the read guard is released above; removing while holding it would deadlock the shard
        self.entries
            .remove_if(key, |_, entry| !entry.is_fresh(now, self.ttl));
        None
    }

    pub fn contains_key(&self, key: &CacheKey) -> bool {
        self.get(key).is_some()
    }

    pub fn insert(&self, key: CacheKey, value: V) {
        let _epoch = self.epoch.read();
        self.write(key, value);
    }

    /// Writes only if no invalidation happened since `epoch` was observed.
    pub fn insert_at_epoch(&self, epoch: u64, key: CacheKey, value: V) -> bool {
        let current = self.epoch.read();
        if *current != epoch {
            return false;
        }
        self.write(key, value);
        true
    }

    fn write(&self, key: CacheKey, value: V) {
        self.entries.insert(
            key,
            StoredEntry {
                value,
                written_at: Instant::now(),
            },
        );
    }

    pub fn invalidate_all(&self) {
        let mut epoch = self.epoch.write();
        *epoch = epoch.wrapping_add(1);
        self.entries.clear();
    }

    /// Removes every expired entry and returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let keep = entry.is_fresh(now, self.ttl);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
