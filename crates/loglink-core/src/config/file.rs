//! File-based configuration (YAML)

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::env::ENV_CONFIG_PATH;
use super::ConfigResult;
use crate::diagnostics::{ConsoleSink, FileSink, NoOpSink, SharedSink};
use crate::level::LogLevel;
use crate::providers::ProviderKind;

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FacadeConfig {
    /// Turn every log call into a no-op
    #[serde(default)]
    pub disabled: bool,

    /// Only probe this provider
    #[serde(default)]
    pub provider: Option<ProviderKind>,

    /// Per-provider settings
    #[serde(default)]
    pub providers: BTreeMap<ProviderKind, ProviderSettings>,

    /// Where the facade reports its own diagnostics
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

/// Settings for one provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Availability override; `false` hides the provider from detection
    #[serde(default = "default_true")]
    pub available: bool,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self { available: true }
    }
}

/// Diagnostics side channel settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    #[serde(default)]
    pub sink: SinkKind,

    #[serde(default = "default_diagnostics_level")]
    pub level: LogLevel,

    /// File for `sink: file`; defaults to the temp directory
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            sink: SinkKind::None,
            level: default_diagnostics_level(),
            path: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    #[default]
    None,
    Console,
    File,
}

fn default_true() -> bool {
    true
}

fn default_diagnostics_level() -> LogLevel {
    LogLevel::Warn
}

impl FacadeConfig {
    /// Availability override for `kind` (default true)
    pub fn is_provider_available(&self, kind: ProviderKind) -> bool {
        self.providers.get(&kind).map_or(true, |p| p.available)
    }

    /// Build the diagnostics sink described by this config
    pub fn build_sink(&self) -> SharedSink {
        let diagnostics = &self.diagnostics;
        match diagnostics.sink {
            SinkKind::None => Arc::new(NoOpSink::new()),
            SinkKind::Console => Arc::new(ConsoleSink::new().with_min_level(diagnostics.level)),
            SinkKind::File => {
                let path = diagnostics.path.clone().unwrap_or_else(FileSink::default_path);
                Arc::new(FileSink::new(path, diagnostics.level))
            }
        }
    }
}

/// Reads `FacadeConfig` from a YAML file
///
/// # Example
///
/// ```no_run
/// use loglink_core::config::FileConfigSource;
///
/// let config = FileConfigSource::user().load().unwrap_or_default();
/// ```
#[derive(Debug, Clone)]
pub struct FileConfigSource {
    path: PathBuf,
}

impl FileConfigSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// User-level config (~/.config/loglink/config.yaml)
    pub fn user() -> Self {
        // Use XDG config directory (~/.config on Linux, ~/Library/Application Support on macOS)
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".config"));
        Self::new(config_dir.join("loglink").join("config.yaml"))
    }

    /// `$LOGLINK_CONFIG` if set, else the user-level file
    pub fn from_env_or_user() -> Self {
        match std::env::var_os(ENV_CONFIG_PATH) {
            Some(path) if !path.is_empty() => Self::new(path),
            _ => Self::user(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load config from file; a missing file yields defaults
    pub fn load(&self) -> ConfigResult<FacadeConfig> {
        if !self.path.exists() {
            return Ok(FacadeConfig::default());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(FacadeConfig::default());
        }
        Ok(serde_yaml::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempdir().unwrap();
        let source = FileConfigSource::new(dir.path().join("config.yaml"));

        assert!(!source.exists());
        assert_eq!(source.load().unwrap(), FacadeConfig::default());
    }

    #[test]
    fn test_yaml_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            r#"
disabled: false
provider: memlog
providers:
  log:
    available: false
  memlog: {}
diagnostics:
  sink: file
  level: debug
  path: /tmp/loglink-test.log
"#,
        )
        .unwrap();

        let config = FileConfigSource::new(&path).load().unwrap();
        assert_eq!(config.provider, Some(ProviderKind::MemLog));
        assert!(!config.is_provider_available(ProviderKind::Log));
        assert!(config.is_provider_available(ProviderKind::MemLog));
        assert_eq!(config.diagnostics.sink, SinkKind::File);
        assert_eq!(config.diagnostics.level, LogLevel::Debug);
        assert_eq!(
            config.diagnostics.path.as_deref(),
            Some(Path::new("/tmp/loglink-test.log"))
        );
    }

    #[test]
    fn test_invalid_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "provider: [not, a, kind]").unwrap();

        assert!(FileConfigSource::new(&path).load().is_err());
    }

    #[test]
    fn test_empty_file_is_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "\n").unwrap();

        assert_eq!(FileConfigSource::new(&path).load().unwrap(), FacadeConfig::default());
    }

    #[test]
    fn test_defaults() {
        let config = FacadeConfig::default();
        assert!(!config.disabled);
        assert!(config.provider.is_none());
        assert!(config.is_provider_available(ProviderKind::MemLog));
        assert_eq!(config.diagnostics.sink, SinkKind::None);
        assert_eq!(config.diagnostics.level, LogLevel::Warn);
    }
}
