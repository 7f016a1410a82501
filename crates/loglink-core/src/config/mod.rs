//! Facade configuration
//!
//! Sources, later ones winning:
//! - YAML file (`$LOGLINK_CONFIG`, else `~/.config/loglink/config.yaml`)
//! - `LOGLINK_*` environment variables

mod env;
mod file;

pub use env::{apply_overrides, ENV_CONFIG_PATH, ENV_DIAGNOSTICS, ENV_DIAGNOSTICS_LEVEL, ENV_DISABLED, ENV_PROVIDER};
pub use file::{DiagnosticsConfig, FacadeConfig, FileConfigSource, ProviderSettings, SinkKind};

use crate::diagnostics::{ConsoleSink, DiagnosticSink};

/// Errors that can occur while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Load configuration for the global facade
///
/// Never fails: a broken file or variable is reported on stderr and the
/// remaining sources still apply.
pub fn load_config() -> FacadeConfig {
    let source = FileConfigSource::from_env_or_user();
    let mut config = match source.load() {
        Ok(config) => config,
        Err(e) => {
            ConsoleSink::new().error(&format!(
                "Ignoring config file {}: {}",
                source.path().display(),
                e
            ));
            FacadeConfig::default()
        }
    };

    if let Err(e) = apply_overrides(&mut config, std::env::vars()) {
        ConsoleSink::new().error(&format!("Ignoring environment override: {}", e));
    }
    config
}
