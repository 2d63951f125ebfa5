#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ambari_logsearch_cache::{
    ControllerSlot, HelperError, HostLogFiles, LogSearchDataRetrievalService,
    LoggingRequestHelper, LoggingRequestHelperFactory, ManagementController,
};
use ambari_logsearch_config::ConfigProvider;
use async_trait::async_trait;
use tokio::sync::Semaphore;

pub type Responder = dyn Fn(&str) -> Result<Option<HostLogFiles>, HelperError> + Send + Sync;

#[derive(Debug)]
pub struct TestController;

impl ManagementController for TestController {
    fn name(&self) -> &str {
        "test-controller"
    }
}

pub struct TestConfig {
    pub ttl: Duration,
    pub workers: usize,
    pub timeout: Duration,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3_600),
            workers: 1,
            timeout: Duration::from_secs(5),
        }
    }
}

impl ConfigProvider for TestConfig {
    fn metadata_cache_expire_hours(&self) -> u32 {
        (self.ttl.as_secs() / 3_600) as u32
    }

    fn cache_ttl(&self) -> Duration {
        self.ttl
    }

    fn fetch_workers(&self) -> usize {
        self.workers
    }

    fn fetch_timeout(&self) -> Duration {
        self.timeout
    }
}

/// Helper whose listing calls block until the gate is opened.
pub struct ScriptedHelper {
    responder: Box<Responder>,
    gate: Semaphore,
    pub list_calls: AtomicUsize,
    pub tail_calls: AtomicUsize,
    pub build_tail: bool,
}

impl ScriptedHelper {
    pub fn new(
        responder: impl Fn(&str) -> Result<Option<HostLogFiles>, HelperError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self::build(responder, true, true))
    }

    pub fn gated(
        responder: impl Fn(&str) -> Result<Option<HostLogFiles>, HelperError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self::build(responder, false, true))
    }

    pub fn without_tail_uris() -> Arc<Self> {
        Arc::new(Self::build(|_| Ok(None), true, false))
    }

    fn build(
        responder: impl Fn(&str) -> Result<Option<HostLogFiles>, HelperError> + Send + Sync + 'static,
        open: bool,
        build_tail: bool,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            gate: Semaphore::new(if open { 1 } else { 0 }),
            list_calls: AtomicUsize::new(0),
            tail_calls: AtomicUsize::new(0),
            build_tail,
        }
    }

    pub fn open(&self) {
        self.gate.add_permits(1);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn tail_calls(&self) -> usize {
        self.tail_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LoggingRequestHelper for ScriptedHelper {
    async fn fetch_log_file_names(&self, host: &str) -> Result<Option<HostLogFiles>, HelperError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| HelperError::Unavailable)?;
        (self.responder)(host)
    }

    fn build_tail_uri(&self, base_uri: &str, component: &str, host: &str) -> Option<String> {
        self.tail_calls.fetch_add(1, Ordering::SeqCst);
        if !self.build_tail {
            return None;
        }
        Some(format!(
            "{base_uri}?component_name={component}&host_name={host}"
        ))
    }
}

pub struct TestFactory {
    helper: Option<Arc<ScriptedHelper>>,
    pub lookups: AtomicUsize,
}

impl TestFactory {
    pub fn with_helper(helper: Arc<ScriptedHelper>) -> Arc<Self> {
        Arc::new(Self {
            helper: Some(helper),
            lookups: AtomicUsize::new(0),
        })
    }

    pub fn unconfigured() -> Arc<Self> {
        Arc::new(Self {
            helper: None,
            lookups: AtomicUsize::new(0),
        })
    }
}

impl LoggingRequestHelperFactory for TestFactory {
    fn helper(
        &self,
        _controller: &dyn ManagementController,
        _cluster: &str,
    ) -> Option<Arc<dyn LoggingRequestHelper>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.helper
            .clone()
            .map(|helper| helper as Arc<dyn LoggingRequestHelper>)
    }
}

pub fn service_with(
    factory: Arc<TestFactory>,
    config: TestConfig,
) -> Arc<LogSearchDataRetrievalService> {
    Arc::new(LogSearchDataRetrievalService::new(
        Arc::new(config),
        factory,
        Arc::new(ControllerSlot::with_controller(Arc::new(TestController))),
    ))
}

pub fn files(entries: Vec<(&str, Vec<&str>)>) -> HostLogFiles {
    entries
        .into_iter()
        .map(|(component, names)| {
            (
                component.to_string(),
                names.iter().map(|name| name.to_string()).collect(),
            )
        })
        .collect()
}

/// Polls `condition` until it holds, panicking after a few seconds.
pub async fn wait_until(condition: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

pub async fn wait_idle(service: &LogSearchDataRetrievalService) {
    wait_until(|| service.in_flight_keys().is_empty() && service.pending_fetches() == 0).await;
}
