use std::path::{Path, PathBuf};

use ambari_logsearch_config::{load_config, LogSearchConfig};
use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const LOCAL_CONFIG: &str = "config/logsearch.yaml";

/// Installs the global tracing subscriber. `RUST_LOG` wins over `level` when set.
///
/// Calling this more than once leaves the first subscriber in place.
pub fn init_logging(level: &str, debug: bool) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };

    let installed = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string())),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
    Ok(())
}

/// Picks the configuration file to read.
///
/// Priority: explicit path > ./config/logsearch.yaml > <config dir>/ambari/logsearch.yaml
pub fn locate_config(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    let local = PathBuf::from(LOCAL_CONFIG);
    if local.exists() {
        return local;
    }
    match dirs::config_dir() {
        Some(mut path) => {
            path.push("ambari");
            path.push("logsearch.yaml");
            path
        }
        None => local,
    }
}

pub struct LoadedSettings {
    pub config: LogSearchConfig,
    pub path: PathBuf,
}

pub fn load_settings(explicit: Option<&Path>) -> Result<LoadedSettings> {
    let path = locate_config(explicit);
    if path.exists() {
        info!(path = %path.display(), "loading logsearch configuration");
    } else {
        warn!(path = %path.display(), "logsearch config file not found, using defaults");
    }

    let loaded = load_config(Some(path.as_path()))
        .with_context(|| format!("Failed to load logsearch config from {}", path.display()))?;
    Ok(LoadedSettings {
        config: loaded.config,
        path,
    })
}
