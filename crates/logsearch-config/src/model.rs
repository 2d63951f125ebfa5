use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Upper bound on concurrently running fetches.
pub const MAX_FETCH_WORKERS: usize = 256;

/// Settings for the LogSearch metadata retrieval cache.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LogSearchConfig {
    /// Expire-after-write lifetime of both metadata caches, in hours.
    pub metadata_cache_expire_hours: u32,
    /// Deadline applied to a single remote file-name listing.
    pub fetch_timeout_ms: u64,
    /// Number of fetches allowed to run at the same time.
    pub fetch_workers: usize,
    pub maintenance_interval_secs: u64,
}

impl Default for LogSearchConfig {
    fn default() -> Self {
        Self {
            metadata_cache_expire_hours: 24,
            fetch_timeout_ms: 5_000,
            fetch_workers: 1,
            maintenance_interval_secs: 300,
        }
    }
}

impl LogSearchConfig {
    pub const FIELDS: [&'static str; 4] = [
        "metadata_cache_expire_hours",
        "fetch_timeout_ms",
        "fetch_workers",
        "maintenance_interval_secs",
    ];
}

/// Where a configuration value was taken from.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConfigSource {
    Builtin,
    File,
    Env,
}

/// Read-only view of the settings the retrieval service consumes.
pub trait ConfigProvider: Send + Sync {
    fn metadata_cache_expire_hours(&self) -> u32;

    fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(5_000)
    }

    fn fetch_workers(&self) -> usize {
        1
    }

    fn maintenance_interval(&self) -> Duration {
        Duration::from_secs(300)
    }

    fn cache_ttl(&self) -> Duration {
        Duration::from_secs(u64::from(self.metadata_cache_expire_hours()) * 3_600)
    }
}

impl ConfigProvider for LogSearchConfig {
    fn metadata_cache_expire_hours(&self) -> u32 {
        self.metadata_cache_expire_hours
    }

    fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms.max(1))
    }

    fn fetch_workers(&self) -> usize {
        self.fetch_workers.clamp(1, MAX_FETCH_WORKERS)
    }

    fn maintenance_interval(&self) -> Duration {
        Duration::from_secs(self.maintenance_interval_secs.max(1))
    }
}
