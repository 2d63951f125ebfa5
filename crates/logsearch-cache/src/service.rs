use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use ambari_core_types::CacheKey;
use ambari_logsearch_config::ConfigProvider;
use parking_lot::RwLock;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::RetrievalError;
use crate::executor::FetchExecutor;
use crate::helper::{ControllerAccessor, LoggingRequestHelperFactory};
use crate::ledger::{Admission, RequestLedger};
use crate::metrics::{RetrievalStats, StatsSnapshot};
use crate::store::ExpiringStore;
use crate::task::{FetchContext, FetchRequest, FileNameFetch};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServiceState {
    Idle,
    Running,
    Stopped,
}

enum Lifecycle {
    Idle,
    Running(RunningService),
    Stopped,
}

struct RunningService {
    file_names: Arc<ExpiringStore<BTreeSet<String>>>,
    tail_uris: Arc<ExpiringStore<String>>,
    fetch: FetchContext,
    executor: FetchExecutor,
    maintenance: MaintenanceHandle,
}

/// Cancels the periodic expiry sweep when dropped.
struct MaintenanceHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Drop for MaintenanceHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Cached, non-blocking access to LogSearch metadata for host components.
///
/// Both caches start empty. The first lookup of a file-name listing queues a remote
/// request and returns `None`; callers are expected to ask again later. Tail URIs are
/// built synchronously because constructing one is a local string operation.
pub struct LogSearchDataRetrievalService {
    config: Arc<dyn ConfigProvider>,
    factory: Arc<dyn LoggingRequestHelperFactory>,
    controllers: Arc<dyn ControllerAccessor>,
    ledger: Arc<RequestLedger>,
    stats: Arc<RetrievalStats>,
    lifecycle: RwLock<Lifecycle>,
}

impl LogSearchDataRetrievalService {
    pub fn new(
        config: Arc<dyn ConfigProvider>,
        factory: Arc<dyn LoggingRequestHelperFactory>,
        controllers: Arc<dyn ControllerAccessor>,
    ) -> Self {
        Self {
            config,
            factory,
            controllers,
            ledger: Arc::new(RequestLedger::new()),
            stats: Arc::new(RetrievalStats::default()),
            lifecycle: RwLock::new(Lifecycle::Idle),
        }
    }

    /// Starts the service on the ambient tokio runtime.
    pub fn start(&self) -> Result<(), RetrievalError> {
        let handle = Handle::try_current().map_err(|_| RetrievalError::NoRuntime)?;
        self.start_on(&handle)
    }

    pub fn start_on(&self, handle: &Handle) -> Result<(), RetrievalError> {
        let mut lifecycle = self.lifecycle.write();
        match *lifecycle {
            Lifecycle::Idle => {}
            Lifecycle::Running(_) => return Err(RetrievalError::AlreadyStarted),
            Lifecycle::Stopped => return Err(RetrievalError::Stopped),
        }

        let expire_hours = self.config.metadata_cache_expire_hours();
        let ttl = self.config.cache_ttl();
        let workers = self.config.fetch_workers().max(1);
        debug!(
            expire_hours,
            ttl_secs = ttl.as_secs(),
            workers,
            "initializing logsearch metadata caches"
        );

        let file_names = Arc::new(ExpiringStore::new(ttl));
        let tail_uris = Arc::new(ExpiringStore::new(ttl));
        let fetch = FetchContext {
            store: Arc::clone(&file_names),
            ledger: Arc::clone(&self.ledger),
            factory: Arc::clone(&self.factory),
            controllers: Arc::clone(&self.controllers),
            stats: Arc::clone(&self.stats),
            timeout: self.config.fetch_timeout(),
        };
        let executor = FetchExecutor::start(handle, workers);
        let maintenance = spawn_maintenance(
            handle,
            Arc::clone(&file_names),
            Arc::clone(&tail_uris),
            self.config.maintenance_interval(),
        );

        *lifecycle = Lifecycle::Running(RunningService {
            file_names,
            tail_uris,
            fetch,
            executor,
            maintenance,
        });
        info!(expire_hours, workers, "logsearch data retrieval service started");
        Ok(())
    }

    /// Invalidates both caches and stops accepting fetches.
    ///
    /// Fetches already queued or running complete, but their results are not cached.
    pub fn stop(&self) {
        let mut lifecycle = self.lifecycle.write();
        if !matches!(*lifecycle, Lifecycle::Running(_)) {
            return;
        }
        if let Lifecycle::Running(running) = std::mem::replace(&mut *lifecycle, Lifecycle::Stopped) {
            debug!("invalidating logsearch caches");
            running.file_names.invalidate_all();
            running.tail_uris.invalidate_all();
            let _ = running.executor.shutdown();
            drop(running.maintenance);
            info!(
                pending = running.executor.pending(),
                "logsearch data retrieval service stopped"
            );
        }
    }

    pub fn state(&self) -> ServiceState {
        match *self.lifecycle.read() {
            Lifecycle::Idle => ServiceState::Idle,
            Lifecycle::Running(_) => ServiceState::Running,
            Lifecycle::Stopped => ServiceState::Stopped,
        }
    }

    /// Returns the cached log file names for `component` on `host`.
    ///
    /// On a miss this queues a remote request (unless one is pending or the component has
    /// failed too often) and returns `None` without waiting for it.
    pub fn log_file_names(
        &self,
        component: &str,
        host: &str,
        cluster: &str,
    ) -> Option<BTreeSet<String>> {
        let lifecycle = self.lifecycle.read();
        let Lifecycle::Running(running) = &*lifecycle else {
            debug!(component, host, "logsearch retrieval service not running");
            return None;
        };

        let key = CacheKey::new(component, host);
        if let Some(names) = running.file_names.get(&key) {
            self.stats.record_hit();
            debug!(key = %key, "log file names found in cache");
            return Some(names);
        }
        self.stats.record_miss();

        match self.ledger.admit(component, &key) {
            Admission::Tripped => {
                self.stats.record_skipped_tripped();
                debug!(
                    component,
                    "too many failures fetching log file metadata; ignoring component for LogSearch integration"
                );
            }
            Admission::InFlight => {
                self.stats.record_deduplicated();
                debug!(key = %key, "log file names requested but not completed yet");
            }
            Admission::Admitted(guard) => {
                debug!(key = %key, "log file names not in cache; queueing remote request");
                let fetch = FileNameFetch::new(
                    FetchRequest::new(component, host, cluster),
                    running.fetch.clone(),
                    guard,
                );
                if running.executor.submit(fetch) {
                    self.stats.record_dispatched();
                } else {
                    warn!(key = %key, "logsearch fetch executor closed; request dropped");
                }
            }
        }
        None
    }

    /// Returns the URI for tailing the log of `component` on `host`, building and caching
    /// it on a miss. Nothing is cached when the helper cannot build one.
    pub fn log_file_tail_uri(
        &self,
        base_uri: &str,
        component: &str,
        host: &str,
        cluster: &str,
    ) -> Option<String> {
        let lifecycle = self.lifecycle.read();
        let Lifecycle::Running(running) = &*lifecycle else {
            debug!(component, host, "logsearch retrieval service not running");
            return None;
        };

        let key = CacheKey::new(component, host);
        if let Some(uri) = running.tail_uris.get(&key) {
            self.stats.record_tail_uri_hit();
            return Some(uri);
        }
        self.stats.record_tail_uri_miss();

        let Some(controller) = self.controllers.controller() else {
            debug!("no management controller available; cannot build tail URI");
            return None;
        };
        let Some(helper) = self.factory.helper(controller.as_ref(), cluster) else {
            debug!(cluster, "logsearch request helper unavailable; cannot build tail URI");
            return None;
        };
        let uri = helper.build_tail_uri(base_uri, component, host)?;
        running.tail_uris.insert(key, uri.clone());
        Some(uri)
    }

    pub fn in_flight_keys(&self) -> Vec<CacheKey> {
        self.ledger.in_flight_keys()
    }

    pub fn is_in_flight(&self, component: &str, host: &str) -> bool {
        self.ledger.is_in_flight(&CacheKey::new(component, host))
    }

    pub fn failure_count(&self, component: &str) -> u32 {
        self.ledger.failure_count(component)
    }

    /// Fetches queued or running; zero when the service is not running.
    pub fn pending_fetches(&self) -> usize {
        match &*self.lifecycle.read() {
            Lifecycle::Running(running) => running.executor.pending(),
            _ => 0,
        }
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

fn spawn_maintenance(
    handle: &Handle,
    file_names: Arc<ExpiringStore<BTreeSet<String>>>,
    tail_uris: Arc<ExpiringStore<String>>,
    period: Duration,
) -> MaintenanceHandle {
    let cancel = CancellationToken::new();
    let loop_token = cancel.clone();
    let task = handle.spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = loop_token.cancelled() => break,
                _ = ticker.tick() => {
                    let purged = file_names.purge_expired() + tail_uris.purge_expired();
                    if purged > 0 {
                        debug!(purged, "purged expired logsearch cache entries");
                    }
                }
            }
        }
    });
    MaintenanceHandle {
        cancel,
        task: Some(task),
    }
}
