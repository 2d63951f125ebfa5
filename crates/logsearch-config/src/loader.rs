use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::ConfigError;
use crate::model::{ConfigSource, LogSearchConfig, MAX_FETCH_WORKERS};

const ENV_PREFIX: &str = "AMBARI_LOGSEARCH__";
const ENV_JSON: &str = "AMBARI_LOGSEARCH_OVERRIDE_JSON";

#[derive(Debug, Default)]
pub struct LoadOptions {
    pub paths: Vec<PathBuf>,
    pub include_env: bool,
}

impl LoadOptions {
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            paths: vec![path.into()],
            include_env: true,
        }
    }
}

/// Resolved configuration plus the source each field was last set from.
#[derive(Clone, Debug)]
pub struct LoadedConfig {
    pub config: LogSearchConfig,
    pub provenance: HashMap<String, ConfigSource>,
}

impl LoadedConfig {
    fn builtin() -> Self {
        let provenance = LogSearchConfig::FIELDS
            .iter()
            .map(|field| (field.to_string(), ConfigSource::Builtin))
            .collect();
        Self {
            config: LogSearchConfig::default(),
            provenance,
        }
    }

    pub fn source_of(&self, field: &str) -> Option<ConfigSource> {
        self.provenance.get(field).copied()
    }
}

pub fn load_config(path: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    let mut options = LoadOptions {
        include_env: true,
        ..LoadOptions::default()
    };
    if let Some(p) = path {
        options.paths.push(p.to_path_buf());
    }
    load_config_with_options(&options)
}

pub fn load_config_with_options(options: &LoadOptions) -> Result<LoadedConfig, ConfigError> {
    let mut loaded = LoadedConfig::builtin();

    for path in &options.paths {
        if path.exists() {
            let overlays = overlays_from_file(path)?;
            apply_overlays(&mut loaded, overlays)?;
        } else {
            debug!(path = %path.display(), "logsearch config file not found; skipping");
        }
    }

    if options.include_env {
        let overlays = overlays_from_env()?;
        apply_overlays(&mut loaded, overlays)?;
    }

    Ok(loaded)
}

struct ConfigOverlay {
    field: String,
    value: Value,
    source: ConfigSource,
}

fn apply_overlays(loaded: &mut LoadedConfig, overlays: Vec<ConfigOverlay>) -> Result<(), ConfigError> {
    for overlay in overlays {
        apply_field(&mut loaded.config, &overlay.field, &overlay.value)?;
        loaded.provenance.insert(overlay.field, overlay.source);
    }
    Ok(())
}

fn apply_field(config: &mut LogSearchConfig, field: &str, value: &Value) -> Result<(), ConfigError> {
    match field {
        "metadata_cache_expire_hours" => config.metadata_cache_expire_hours = to_u32(field, value)?,
        "fetch_timeout_ms" => config.fetch_timeout_ms = to_positive_u64(field, value)?,
        "fetch_workers" => config.fetch_workers = to_workers(field, value)?,
        "maintenance_interval_secs" => config.maintenance_interval_secs = to_u64(field, value)?,
        other => return Err(ConfigError::Invalid(format!("unknown field `{other}`"))),
    }
    Ok(())
}

fn overlays_from_file(path: &Path) -> Result<Vec<ConfigOverlay>, ConfigError> {
    let content = fs::read_to_string(path).map_err(|err| ConfigError::Io(format!("{}", err)))?;
    let yaml_value: serde_yaml::Value =
        serde_yaml::from_str(&content).map_err(|err| ConfigError::Invalid(format!("{}", err)))?;
    let json_value =
        serde_json::to_value(yaml_value).map_err(|err| ConfigError::Invalid(format!("{}", err)))?;
    overlays_from_object(json_value, ConfigSource::File)
}

fn overlays_from_env() -> Result<Vec<ConfigOverlay>, ConfigError> {
    let mut overlays = Vec::new();
    for (key, raw) in env::vars() {
        if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
            let field = stripped.trim().to_ascii_lowercase();
            if field.is_empty() {
                continue;
            }
            overlays.push(ConfigOverlay {
                field,
                value: parse_env_value(&raw),
                source: ConfigSource::Env,
            });
        }
    }

    if let Ok(raw_json) = env::var(ENV_JSON) {
        if !raw_json.trim().is_empty() {
            let json_value: Value = serde_json::from_str(&raw_json)
                .map_err(|err| ConfigError::Invalid(format!("{}", err)))?;
            overlays.extend(overlays_from_object(json_value, ConfigSource::Env)?);
        }
    }

    Ok(overlays)
}

fn overlays_from_object(value: Value, source: ConfigSource) -> Result<Vec<ConfigOverlay>, ConfigError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Object(map) => Ok(map
            .into_iter()
            .map(|(key, value)| ConfigOverlay {
                field: key.trim().to_ascii_lowercase(),
                value,
                source,
            })
            .collect()),
        other => Err(ConfigError::Invalid(format!(
            "expected a mapping at the top level, got {other}"
        ))),
    }
}

fn parse_env_value(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    if let Ok(parsed) = serde_json::from_str::<Value>(raw) {
        return parsed;
    }
    Value::String(raw.to_string())
}

fn to_u64(field: &str, value: &Value) -> Result<u64, ConfigError> {
    value.as_u64().ok_or_else(|| {
        ConfigError::InvalidValue(format!("{field}: expected non-negative integer, got {value}"))
    })
}

fn to_positive_u64(field: &str, value: &Value) -> Result<u64, ConfigError> {
    match to_u64(field, value)? {
        0 => Err(ConfigError::InvalidValue(format!("{field}: must be greater than zero"))),
        raw => Ok(raw),
    }
}

fn to_workers(field: &str, value: &Value) -> Result<usize, ConfigError> {
    let raw = to_u64(field, value)?;
    match usize::try_from(raw) {
        Ok(workers) if workers <= MAX_FETCH_WORKERS => Ok(workers),
        _ => Err(ConfigError::InvalidValue(format!(
            "{field}: value {raw} exceeds {MAX_FETCH_WORKERS}"
        ))),
    }
}

fn to_u32(field: &str, value: &Value) -> Result<u32, ConfigError> {
    let raw = to_u64(field, value)?;
    u32::try_from(raw)
        .map_err(|_| ConfigError::InvalidValue(format!("{field}: value {raw} exceeds u32")))
}
