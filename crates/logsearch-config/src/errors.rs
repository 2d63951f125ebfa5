use ambari_core_types::AmbariError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(String),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

impl From<ConfigError> for AmbariError {
    fn from(value: ConfigError) -> Self {
        AmbariError::new(value.to_string())
    }
}
