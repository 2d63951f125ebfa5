use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use ambari_core_types::CacheKey;
use parking_lot::Mutex;
use tracing::warn;

/// Failed metadata requests tolerated per component before it is skipped for good.
pub const MAX_FAILED_METADATA_REQUESTS: u32 = 10;

#[derive(Debug, Default)]
struct LedgerState {
    in_flight: HashSet<CacheKey>,
    failures: HashMap<String, u32>,
}

/// Tracks in-flight fetches per key and failed fetches per component.
///
/// Both live behind one lock so that the threshold check, the in-flight check and the
/// in-flight insert happen as a single step.
#[derive(Debug)]
pub struct RequestLedger {
    state: Mutex<LedgerState>,
    threshold: u32,
}

/// Result of asking the ledger whether a fetch may be dispatched.
#[derive(Debug)]
pub enum Admission {
    Admitted(InFlightGuard),
    InFlight,
    Tripped,
}

impl Default for RequestLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestLedger {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            threshold: MAX_FAILED_METADATA_REQUESTS,
        }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn admit(self: &Arc<Self>, component: &str, key: &CacheKey) -> Admission {
        let mut state = self.state.lock();
        let failures = state.failures.get(component).copied().unwrap_or(0);
        if failures >= self.threshold {
            return Admission::Tripped;
        }
        if !state.in_flight.insert(key.clone()) {
            return Admission::InFlight;
        }
        drop(state);
        Admission::Admitted(InFlightGuard {
            ledger: Arc::clone(self),
            key: key.clone(),
        })
    }

    /// Increments the failure counter of `component` and returns the new value.
    pub fn record_failure(&self, component: &str) -> u32 {
        let count = {
            let mut state = self.state.lock();
            let counter = state.failures.entry(component.to_string()).or_insert(0);
            *counter = counter.saturating_add(1);
            *counter
        };
        if count == self.threshold {
            warn!(
                component,
                failures = count,
                "too many failed logsearch metadata requests; ignoring component for LogSearch integration"
            );
        }
        count
    }

    pub fn failure_count(&self, component: &str) -> u32 {
        self.state
            .lock()
            .failures
            .get(component)
            .copied()
            .unwrap_or(0)
    }

    pub fn is_tripped(&self, component: &str) -> bool {
        self.failure_count(component) >= self.threshold
    }

    pub fn is_in_flight(&self, key: &CacheKey) -> bool {
        self.state.lock().in_flight.contains(key)
    }

    pub fn in_flight_keys(&self) -> Vec<CacheKey> {
        let mut keys: Vec<CacheKey> = self.state.lock().in_flight.iter().cloned().collect();
        keys.sort();
        keys
    }

    fn release(&self, key: &CacheKey) {
        self.state.lock().in_flight.remove(key);
    }
}

/// Marks a key as in flight for as long as it is alive.
#[derive(Debug)]
pub struct InFlightGuard {
    ledger: Arc<RequestLedger>,
    key: CacheKey,
}

impl InFlightGuard {
    pub fn key(&self) -> &CacheKey {
        &self.key
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.ledger.release(&self.key);
    }
}
