use ambari_core_types::AmbariError;
use thiserror::Error;

/// Lifecycle failures of the retrieval service. Lookups never surface errors.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("retrieval service already started")]
    AlreadyStarted,
    #[error("retrieval service has been stopped")]
    Stopped,
    #[error("no tokio runtime available to run fetch tasks")]
    NoRuntime,
    #[error("config error: {0}")]
    Config(String),
}

/// Failures reported by a remote LogSearch helper.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum HelperError {
    #[error("logsearch unavailable")]
    Unavailable,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RetrievalError> for AmbariError {
    fn from(value: RetrievalError) -> Self {
        AmbariError::new(value.to_string())
    }
}

impl From<HelperError> for AmbariError {
    fn from(value: HelperError) -> Self {
        AmbariError::new(format!("logsearch helper error: {value}"))
    }
}

impl From<ambari_logsearch_config::ConfigError> for RetrievalError {
    fn from(value: ambari_logsearch_config::ConfigError) -> Self {
        RetrievalError::Config(value.to_string())
    }
}
