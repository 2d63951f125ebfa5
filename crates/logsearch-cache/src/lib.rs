//! LogSearch metadata retrieval cache.
//!
//! Fronts the remote LogSearch service with two expire-after-write caches. File-name
//! listings are fetched off the caller's path by a background executor; each
//! (component, host) key has at most one fetch in flight, and a component that keeps
//! failing is skipped once it reaches [`MAX_FAILED_METADATA_REQUESTS`].

pub mod errors;
pub mod executor;
pub mod helper;
pub mod ledger;
pub mod metrics;
pub mod service;
pub mod store;
pub mod task;

pub use errors::{HelperError, RetrievalError};
pub use executor::FetchExecutor;
pub use helper::{
    ControllerAccessor, ControllerSlot, LoggingRequestHelper, LoggingRequestHelperFactory,
    ManagementController,
};
pub use ledger::{Admission, InFlightGuard, RequestLedger, MAX_FAILED_METADATA_REQUESTS};
pub use metrics::{RetrievalStats, StatsSnapshot};
pub use service::{LogSearchDataRetrievalService, ServiceState};
pub use store::ExpiringStore;
pub use task::{FetchContext, FetchOutcome, FetchRequest, FileNameFetch};

pub use ambari_core_types::{generate_key, CacheKey, HostLogFiles};
