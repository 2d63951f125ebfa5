//! Ambari LogSearch metadata retrieval
//!
//! Bootstrap glue around the retrieval cache: logging setup, configuration discovery and a
//! one-call way to build and start the service.

pub mod bootstrap;
pub mod runtime;

pub use ambari_core_types::{generate_key, AmbariError, CacheKey, HostLogFiles};
pub use ambari_logsearch_cache::{
    ControllerAccessor, ControllerSlot, HelperError, LogSearchDataRetrievalService,
    LoggingRequestHelper, LoggingRequestHelperFactory, ManagementController, RetrievalError,
    ServiceState, StatsSnapshot, MAX_FAILED_METADATA_REQUESTS,
};
pub use ambari_logsearch_config::{ConfigProvider, LogSearchConfig};
pub use bootstrap::bootstrap;
pub use runtime::{init_logging, load_settings, locate_config, LoadedSettings};
