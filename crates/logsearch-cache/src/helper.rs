use std::fmt;
use std::sync::Arc;

use ambari_core_types::HostLogFiles;
use async_trait::async_trait;
use once_cell::sync::OnceCell;

use crate::errors::HelperError;

/// Handle to the management controller that owns cluster state.
pub trait ManagementController: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;
}

/// Resolves the active controller when a fetch runs.
pub trait ControllerAccessor: Send + Sync {
    fn controller(&self) -> Option<Arc<dyn ManagementController>>;
}

/// Client for a single cluster's LogSearch service.
#[async_trait]
pub trait LoggingRequestHelper: Send + Sync {
    /// Lists log files per component on `host`. `Ok(None)` means LogSearch had nothing.
    async fn fetch_log_file_names(&self, host: &str) -> Result<Option<HostLogFiles>, HelperError>;

    /// Builds the URI that tails the log of `component` on `host`. Expected to be cheap.
    fn build_tail_uri(&self, base_uri: &str, component: &str, host: &str) -> Option<String>;
}

pub trait LoggingRequestHelperFactory: Send + Sync {
    /// Returns `None` when LogSearch is not configured or reachable for `cluster`.
    fn helper(
        &self,
        controller: &dyn ManagementController,
        cluster: &str,
    ) -> Option<Arc<dyn LoggingRequestHelper>>;
}

/// Controller accessor that is filled in once during server startup.
#[derive(Debug, Default)]
pub struct ControllerSlot {
    cell: OnceCell<Arc<dyn ManagementController>>,
}

impl ControllerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_controller(controller: Arc<dyn ManagementController>) -> Self {
        let slot = Self::new();
        slot.install(controller);
        slot
    }

    /// Installs the controller. Returns `false` if one was already installed.
    pub fn install(&self, controller: Arc<dyn ManagementController>) -> bool {
        self.cell.set(controller).is_ok()
    }
}

impl ControllerAccessor for ControllerSlot {
    fn controller(&self) -> Option<Arc<dyn ManagementController>> {
        self.cell.get().cloned()
    }
}
