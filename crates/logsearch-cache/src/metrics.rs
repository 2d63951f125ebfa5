use std::sync::atomic::{AtomicU64, Ordering};

/// Counters describing how lookups were served.
#[derive(Debug, Default)]
pub struct RetrievalStats {
    hits: AtomicU64,
    misses: AtomicU64,
    dispatched: AtomicU64,
    deduplicated: AtomicU64,
    skipped_tripped: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    tail_uri_hits: AtomicU64,
    tail_uri_misses: AtomicU64,
}

fn increment(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl RetrievalStats {
    pub fn record_hit(&self) {
        increment(&self.hits);
    }

    pub fn record_miss(&self) {
        increment(&self.misses);
    }

    pub fn record_dispatched(&self) {
        increment(&self.dispatched);
    }

    pub fn record_deduplicated(&self) {
        increment(&self.deduplicated);
    }

    pub fn record_skipped_tripped(&self) {
        increment(&self.skipped_tripped);
    }

    pub fn record_completed(&self) {
        increment(&self.completed);
    }

    pub fn record_failed(&self) {
        increment(&self.failed);
    }

    pub fn record_tail_uri_hit(&self) {
        increment(&self.tail_uri_hits);
    }

    pub fn record_tail_uri_miss(&self) {
        increment(&self.tail_uri_misses);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            deduplicated: self.deduplicated.load(Ordering::Relaxed),
            skipped_tripped: self.skipped_tripped.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            tail_uri_hits: self.tail_uri_hits.load(Ordering::Relaxed),
            tail_uri_misses: self.tail_uri_misses.load(Ordering::Relaxed),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub dispatched: u64,
    pub deduplicated: u64,
    pub skipped_tripped: u64,
    pub completed: u64,
    pub failed: u64,
    pub tail_uri_hits: u64,
    pub tail_uri_misses: u64,
}
