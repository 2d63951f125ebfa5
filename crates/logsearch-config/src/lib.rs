pub mod errors;
pub mod loader;
pub mod model;

pub use errors::ConfigError;
pub use loader::{load_config, load_config_with_options, LoadOptions, LoadedConfig};
pub use model::{ConfigProvider, ConfigSource, LogSearchConfig, MAX_FETCH_WORKERS};
