use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use ambari_core_types::{CacheKey, FetchId, HostLogFiles};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::helper::{ControllerAccessor, LoggingRequestHelperFactory};
use crate::ledger::{InFlightGuard, RequestLedger};
use crate::metrics::RetrievalStats;
use crate::store::ExpiringStore;

/// The (component, host, cluster) triple a fetch was dispatched for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchRequest {
    pub component: String,
    pub host: String,
    pub cluster: String,
}

impl FetchRequest {
    pub fn new(
        component: impl Into<String>,
        host: impl Into<String>,
        cluster: impl Into<String>,
    ) -> Self {
        Self {
            component: component.into(),
            host: host.into(),
            cluster: cluster.into(),
        }
    }

    pub fn key(&self) -> CacheKey {
        CacheKey::new(&self.component, &self.host)
    }
}

/// Shared state a fetch reads from and writes into.
#[derive(Clone)]
pub struct FetchContext {
    pub store: Arc<ExpiringStore<BTreeSet<String>>>,
    pub ledger: Arc<RequestLedger>,
    pub factory: Arc<dyn LoggingRequestHelperFactory>,
    pub controllers: Arc<dyn ControllerAccessor>,
    pub stats: Arc<RetrievalStats>,
    pub timeout: Duration,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response was written into the cache; `entries` components were stored.
    Populated { entries: usize },
    /// The response arrived after the cache was invalidated and was dropped.
    Discarded,
    Empty,
    Failed,
    TimedOut,
    NoController,
    NoHelper,
}

impl FetchOutcome {
    /// Outcomes that count against the requested component's retry budget.
    ///
    /// A missing controller or helper means LogSearch is not set up, which is not counted.
    pub fn counts_as_failure(&self) -> bool {
        matches!(
            self,
            FetchOutcome::Empty | FetchOutcome::Failed | FetchOutcome::TimedOut
        )
    }
}

/// One remote listing of log file names for a host.
pub struct FileNameFetch {
    id: FetchId,
    request: FetchRequest,
    context: FetchContext,
    epoch: u64,
    guard: InFlightGuard,
}

impl FileNameFetch {
    /// Binds the fetch to the store epoch current at dispatch time.
    pub fn new(request: FetchRequest, context: FetchContext, guard: InFlightGuard) -> Self {
        let epoch = context.store.epoch();
        Self {
            id: FetchId::new(),
            request,
            context,
            epoch,
            guard,
        }
    }

    pub fn id(&self) -> &FetchId {
        &self.id
    }

    pub fn request(&self) -> &FetchRequest {
        &self.request
    }

    pub async fn run(self) -> FetchOutcome {
        let FileNameFetch {
            id,
            request,
            context,
            epoch,
            guard,
        } = self;
        debug!(fetch = %id, key = %guard.key(), "logsearch file name fetch starting");

        let outcome = execute(&request, &context, epoch).await;
        if outcome.counts_as_failure() {
            let failures = context.ledger.record_failure(&request.component);
            context.stats.record_failed();
            debug!(
                fetch = %id,
                component = %request.component,
                host = %request.host,
                failures,
                ?outcome,
                "remote logsearch request was not successful"
            );
        } else {
            debug!(fetch = %id, ?outcome, "logsearch file name fetch finished");
        }
        context.stats.record_completed();

        drop(guard);
        outcome
    }
}

async fn execute(request: &FetchRequest, context: &FetchContext, epoch: u64) -> FetchOutcome {
    let Some(controller) = context.controllers.controller() else {
        debug!(cluster = %request.cluster, "no management controller available; skipping logsearch request");
        return FetchOutcome::NoController;
    };
    let Some(helper) = context.factory.helper(controller.as_ref(), &request.cluster) else {
        debug!(
            cluster = %request.cluster,
            "logsearch request helper unavailable; logsearch may not be configured or reachable"
        );
        return FetchOutcome::NoHelper;
    };

    let response = match timeout(context.timeout, helper.fetch_log_file_names(&request.host)).await {
        Ok(Ok(response)) => response,
        Ok(Err(err)) => {
            warn!(host = %request.host, %err, "logsearch file name request failed");
            return FetchOutcome::Failed;
        }
        Err(_) => {
            warn!(
                host = %request.host,
                timeout_ms = context.timeout.as_millis() as u64,
                "logsearch file name request timed out"
            );
            return FetchOutcome::TimedOut;
        }
    };

    match response {
        Some(files) if !files.is_empty() => populate(&request.host, files, &context.store, epoch),
        _ => FetchOutcome::Empty,
    }
}

fn populate(
    host: &str,
    files: HostLogFiles,
    store: &ExpiringStore<BTreeSet<String>>,
    epoch: u64,
) -> FetchOutcome {
    let mut entries = 0;
    for (component, names) in files {
        let key = CacheKey::new(&component, host);
        let names: BTreeSet<String> = names.into_iter().collect();
        if !store.insert_at_epoch(epoch, key, names) {
            debug!(host, "logsearch cache invalidated during fetch; dropping response");
            return FetchOutcome::Discarded;
        }
        entries += 1;
    }
    FetchOutcome::Populated { entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::HelperError;
    use crate::helper::{ControllerSlot, LoggingRequestHelper, ManagementController};
    use crate::ledger::Admission;
    use async_trait::async_trait;

    #[derive(Debug)]
    struct TestController;

    impl ManagementController for TestController {
        fn name(&self) -> &str {
            "test"
        }
    }

    enum Reply {
        Files(HostLogFiles),
        Nothing,
        Error,
        Hang,
    }

    struct ScriptedHelper {
        reply: Reply,
    }

    #[async_trait]
    impl LoggingRequestHelper for ScriptedHelper {
        async fn fetch_log_file_names(
            &self,
            _host: &str,
        ) -> Result<Option<HostLogFiles>, HelperError> {
            match &self.reply {
                Reply::Files(files) => Ok(Some(files.clone())),
                Reply::Nothing => Ok(None),
                Reply::Error => Err(HelperError::Transport("connection refused".into())),
                Reply::Hang => std::future::pending().await,
            }
        }

        fn build_tail_uri(&self, _base_uri: &str, _component: &str, _host: &str) -> Option<String> {
            None
        }
    }

    struct Factory(Option<Arc<ScriptedHelper>>);

    impl LoggingRequestHelperFactory for Factory {
        fn helper(
            &self,
            _controller: &dyn ManagementController,
            _cluster: &str,
        ) -> Option<Arc<dyn LoggingRequestHelper>> {
            self.0
                .clone()
                .map(|helper| helper as Arc<dyn LoggingRequestHelper>)
        }
    }

    fn context(reply: Option<Reply>) -> FetchContext {
        FetchContext {
            store: Arc::new(ExpiringStore::new(Duration::from_secs(3_600))),
            ledger: Arc::new(RequestLedger::new()),
            factory: Arc::new(Factory(
                reply.map(|reply| Arc::new(ScriptedHelper { reply })),
            )),
            controllers: Arc::new(ControllerSlot::with_controller(Arc::new(TestController))),
            stats: Arc::new(RetrievalStats::default()),
            timeout: Duration::from_millis(500),
        }
    }

    fn fetch_for(component: &str, context: &FetchContext) -> FileNameFetch {
        let request = FetchRequest::new(component, "host1", "clusterA");
        let guard = match context.ledger.admit(component, &request.key()) {
            Admission::Admitted(guard) => guard,
            other => panic!("unexpected admission {other:?}"),
        };
        FileNameFetch::new(request, context.clone(), guard)
    }

    fn files(entries: Vec<(&str, Vec<&str>)>) -> HostLogFiles {
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

    #[tokio::test]
    async fn response_populates_every_listed_component() {
        let ctx = context(Some(Reply::Files(files(vec![
            ("NAMENODE", vec!["hadoop-hdfs-namenode.log"]),
            ("DATANODE", vec!["hadoop-hdfs-datanode.log", "hadoop-hdfs-datanode.log"]),
        ]))));

        let outcome = fetch_for("NAMENODE", &ctx).run().await;
        assert_eq!(outcome, FetchOutcome::Populated { entries: 2 });

        let datanode = ctx.store.get(&CacheKey::new("DATANODE", "host1")).unwrap();
        assert_eq!(datanode.len(), 1);
        assert!(ctx.store.get(&CacheKey::new("NAMENODE", "host1")).is_some());
        assert!(ctx.ledger.in_flight_keys().is_empty());
        assert_eq!(ctx.ledger.failure_count("NAMENODE"), 0);
    }

    #[tokio::test]
    async fn empty_response_counts_against_requested_component() {
        let ctx = context(Some(Reply::Files(HostLogFiles::new())));
        assert_eq!(fetch_for("NAMENODE", &ctx).run().await, FetchOutcome::Empty);

        let ctx_none = context(Some(Reply::Nothing));
        assert_eq!(fetch_for("NAMENODE", &ctx_none).run().await, FetchOutcome::Empty);

        assert_eq!(ctx.ledger.failure_count("NAMENODE"), 1);
        assert_eq!(ctx_none.ledger.failure_count("NAMENODE"), 1);
        assert!(ctx.ledger.in_flight_keys().is_empty());
        assert_eq!(ctx.stats.snapshot().failed, 1);
    }

    #[tokio::test]
    async fn helper_error_counts_as_failure() {
        let ctx = context(Some(Reply::Error));
        assert_eq!(fetch_for("HBASE_MASTER", &ctx).run().await, FetchOutcome::Failed);
        assert_eq!(ctx.ledger.failure_count("HBASE_MASTER"), 1);
        assert!(ctx.ledger.in_flight_keys().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_expiry_counts_as_failure() {
        let ctx = context(Some(Reply::Hang));
        assert_eq!(fetch_for("NAMENODE", &ctx).run().await, FetchOutcome::TimedOut);
        assert_eq!(ctx.ledger.failure_count("NAMENODE"), 1);
        assert!(ctx.ledger.in_flight_keys().is_empty());
    }

    #[tokio::test]
    async fn missing_helper_is_not_counted() {
        let ctx = context(None);
        assert_eq!(fetch_for("NAMENODE", &ctx).run().await, FetchOutcome::NoHelper);
        assert_eq!(ctx.ledger.failure_count("NAMENODE"), 0);
        assert!(ctx.ledger.in_flight_keys().is_empty());
    }

    #[tokio::test]
    async fn missing_controller_is_not_counted() {
        let mut ctx = context(Some(Reply::Nothing));
        ctx.controllers = Arc::new(ControllerSlot::new());
        assert_eq!(
            fetch_for("NAMENODE", &ctx).run().await,
            FetchOutcome::NoController
        );
        assert_eq!(ctx.ledger.failure_count("NAMENODE"), 0);
    }

    #[tokio::test]
    async fn response_after_invalidation_is_discarded() {
        let ctx = context(Some(Reply::Files(files(vec![(
            "NAMENODE",
            vec!["hadoop-hdfs-namenode.log"],
        )]))));
        let fetch = fetch_for("NAMENODE", &ctx);
        ctx.store.invalidate_all();

        assert_eq!(fetch.run().await, FetchOutcome::Discarded);
        assert!(ctx.store.is_empty());
        assert_eq!(ctx.ledger.failure_count("NAMENODE"), 0);
        assert!(ctx.ledger.in_flight_keys().is_empty());
    }
}
