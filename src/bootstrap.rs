use std::path::Path;
use std::sync::Arc;

use ambari_logsearch_cache::{
    ControllerAccessor, LogSearchDataRetrievalService, LoggingRequestHelperFactory,
};
use anyhow::{Context, Result};
use tracing::info;

use crate::runtime::load_settings;

/// Loads configuration and starts a retrieval service on the current tokio runtime.
pub fn bootstrap(
    config_path: Option<&Path>,
    factory: Arc<dyn LoggingRequestHelperFactory>,
    controllers: Arc<dyn ControllerAccessor>,
) -> Result<Arc<LogSearchDataRetrievalService>> {
    let settings = load_settings(config_path)?;
    info!(
        path = %settings.path.display(),
        expire_hours = settings.config.metadata_cache_expire_hours,
        "bootstrapping logsearch data retrieval service"
    );

    let service = Arc::new(LogSearchDataRetrievalService::new(
        Arc::new(settings.config),
        factory,
        controllers,
    ));
    service
        .start()
        .context("Failed to start logsearch data retrieval service")?;
    Ok(service)
}
