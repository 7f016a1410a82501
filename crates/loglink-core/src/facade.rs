//! Facade entry points
//!
//! [`LogFacade`] ties a module table, a resolver and the disable switch
//! together. Applications normally use the process-wide instance through the
//! free functions in this module; tests build their own instances over a
//! private [`ModuleRegistry`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::binding::ProviderBinding;
use crate::config::{load_config, FacadeConfig, FileConfigSource};
use crate::context::ScopeGuard;
use crate::diagnostics::{set_diagnostic_sink, GlobalSink, NoOpSink, SharedSink};
use crate::error::LogResult;
use crate::logger::Logger;
use crate::modules::{global_modules, ModuleRegistry};
use crate::providers::{InitializationState, ProviderKind, ProviderResolver, Resolution};
use crate::value::LogValue;

/// Resolves a back-end on first use and hands out loggers
#[derive(Debug)]
pub struct LogFacade {
    resolver: ProviderResolver,
    disabled: Arc<AtomicBool>,
}

impl LogFacade {
    pub fn new(modules: Arc<ModuleRegistry>) -> Self {
        Self::with_sink(modules, Arc::new(NoOpSink::new()))
    }

    pub fn with_sink(modules: Arc<ModuleRegistry>, sink: SharedSink) -> Self {
        Self {
            resolver: ProviderResolver::new(modules).with_sink(sink),
            disabled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Apply the provider preference, availability overrides and kill switch
    pub fn from_config(modules: Arc<ModuleRegistry>, config: &FacadeConfig, sink: SharedSink) -> Self {
        let facade = Self {
            resolver: ProviderResolver::new(modules)
                .with_sink(sink)
                .with_preferred(config.provider),
            disabled: Arc::new(AtomicBool::new(config.disabled)),
        };
        for kind in ProviderKind::ALL {
            facade
                .resolver
                .set_available(kind, config.is_provider_available(kind));
        }
        facade
    }

    /// Build from a YAML config file; a missing file yields defaults
    pub fn from_config_file(modules: Arc<ModuleRegistry>, source: &FileConfigSource, sink: SharedSink) -> LogResult<Self> {
        let config = source.load()?;
        Ok(Self::from_config(modules, &config, sink))
    }

    /// Logger named `name`; resolves the back-end on first call
    pub fn get_logger(&self, name: &str) -> Logger {
        let disabled = Arc::clone(&self.disabled);
        match self.resolver.resolve() {
            Resolution::Bound(binding) => match binding.create_handle(name) {
                Some(handle) => Logger::bound(handle, disabled),
                None => Logger::no_op(name, disabled),
            },
            Resolution::Absent => Logger::no_op(name, disabled),
            Resolution::Failed(cause) => Logger::failed(name, Arc::clone(cause), disabled),
        }
    }

    /// Push `value` onto the nested diagnostic context
    pub fn open_nested_context(&self, value: impl Into<LogValue>) -> ScopeGuard {
        match self.active_binding() {
            Some(binding) => binding.open_nested(value.into()),
            None => ScopeGuard::noop(),
        }
    }

    /// Set `key` in the mapped diagnostic context until the guard is released
    ///
    /// `destructure` renders structured values as JSON for back-ends that only
    /// store strings.
    pub fn open_mapped_context(&self, key: &str, value: impl Into<LogValue>, destructure: bool) -> ScopeGuard {
        match self.active_binding() {
            Some(binding) => binding.open_mapped(key, value.into(), destructure),
            None => ScopeGuard::noop(),
        }
    }

    /// Availability override; only effective before the first resolution
    pub fn set_provider_available(&self, kind: ProviderKind, available: bool) {
        self.resolver.set_available(kind, available);
    }

    pub fn is_provider_available(&self, kind: ProviderKind) -> bool {
        self.resolver.is_available(kind)
    }

    /// Turn every log call into a no-op (or back)
    pub fn set_disabled(&self, disabled: bool) {
        self.disabled.store(disabled, Ordering::Relaxed);
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Relaxed)
    }

    pub fn initialization_state(&self) -> InitializationState {
        self.resolver.state()
    }

    /// The bound back-end; resolves on first call
    pub fn current_provider(&self) -> LogResult<ProviderKind> {
        self.resolver.resolve().binding().map(|binding| binding.kind())
    }

    pub fn resolver(&self) -> &ProviderResolver {
        &self.resolver
    }

    fn active_binding(&self) -> Option<&Arc<ProviderBinding>> {
        if self.is_disabled() {
            return None;
        }
        match self.resolver.resolve() {
            Resolution::Bound(binding) => Some(binding),
            _ => None,
        }
    }
}

static GLOBAL_FACADE: Lazy<LogFacade> = Lazy::new(|| {
    let config = load_config();
    set_diagnostic_sink(config.build_sink());
    LogFacade::from_config(global_modules(), &config, Arc::new(GlobalSink))
});

/// The process-wide facade over the global module table
pub fn global() -> &'static LogFacade {
    &GLOBAL_FACADE
}

/// Logger from the process-wide facade
pub fn get_logger(name: &str) -> Logger {
    GLOBAL_FACADE.get_logger(name)
}

pub fn open_nested_context(value: impl Into<LogValue>) -> ScopeGuard {
    GLOBAL_FACADE.open_nested_context(value)
}

pub fn open_mapped_context(key: &str, value: impl Into<LogValue>, destructure: bool) -> ScopeGuard {
    GLOBAL_FACADE.open_mapped_context(key, value, destructure)
}

pub fn set_provider_available(kind: ProviderKind, available: bool) {
    GLOBAL_FACADE.set_provider_available(kind, available);
}

pub fn set_disabled(disabled: bool) {
    GLOBAL_FACADE.set_disabled(disabled);
}

pub fn is_disabled() -> bool {
    GLOBAL_FACADE.is_disabled()
}

pub fn initialization_state() -> InitializationState {
    GLOBAL_FACADE.initialization_state()
}

pub fn current_provider() -> LogResult<ProviderKind> {
    GLOBAL_FACADE.current_provider()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::memlog::{MemLogBackend, MemLogOptions};
    use crate::config::ProviderSettings;
    use crate::error::LogError;
    use crate::level::LogLevel;
    use serde_json::json;

    fn facade_with(backend: &MemLogBackend) -> LogFacade {
        let modules = Arc::new(ModuleRegistry::new());
        backend.load_into(&modules);
        LogFacade::new(modules)
    }

    #[test]
    fn test_loggers_share_one_binding() {
        let backend = MemLogBackend::modern();
        let facade = facade_with(&backend);

        let a = facade.get_logger("a");
        let b = facade.get_logger("b");
        assert!(Arc::ptr_eq(a.binding().unwrap(), b.binding().unwrap()));
        assert_eq!(facade.resolver().attempts(), 1);
        assert_eq!(facade.current_provider().unwrap(), ProviderKind::MemLog);
    }

    #[test]
    fn test_no_backend_is_no_op() {
        let facade = LogFacade::new(Arc::new(ModuleRegistry::new()));
        let logger = facade.get_logger("app");

        assert!(logger.is_no_op());
        assert!(!logger.info("hello").unwrap());
        assert!(matches!(facade.current_provider(), Err(LogError::ProviderNotFound)));
        assert!(facade.open_mapped_context("k", "v", false).is_noop());
    }

    #[test]
    fn test_failed_binding_every_call() {
        let backend = MemLogBackend::with_options(MemLogOptions {
            omitted: vec!["memlog.LogManager.get_logger".to_string()],
            ..Default::default()
        });
        let facade = facade_with(&backend);

        let first = facade.get_logger("a").info("x").unwrap_err();
        let second = facade.get_logger("b").is_enabled(LogLevel::Trace).unwrap_err();
        assert!(Arc::ptr_eq(first.cause().unwrap(), second.cause().unwrap()));
        assert_eq!(facade.resolver().attempts(), 1);
        assert!(matches!(facade.initialization_state(), InitializationState::Failed(_)));
    }

    #[test]
    fn test_scoped_contexts_round_trip() {
        let backend = MemLogBackend::modern();
        let facade = facade_with(&backend);
        let logger = facade.get_logger("app");

        {
            let _request = facade.open_mapped_context("request", json!({"id": 9}), true);
            let _step = facade.open_nested_context("load");
            logger.info("working").unwrap();
        }
        logger.info("done").unwrap();

        let records = backend.records();
        assert_eq!(records[0].mapped.get("request"), Some(&json!({"id": 9})));
        assert_eq!(records[0].nested, vec![json!("load")]);
        assert!(records[1].mapped.is_empty());
        assert!(backend.mapped_value("request").is_none());
    }

    #[test]
    fn test_legacy_mapped_reverse_release_restores_absence() {
        let backend = MemLogBackend::legacy();
        let facade = facade_with(&backend);

        let v1 = facade.open_mapped_context("user", "v1", false);
        let v2 = facade.open_mapped_context("user", "v2", false);
        v1.release();
        assert_eq!(backend.mapped_value("user"), Some(json!("v2")));
        v2.release();
        assert!(backend.mapped_value("user").is_none());
    }

    #[test]
    fn test_scoped_mapped_reverse_release_restores_absence() {
        let backend = MemLogBackend::modern();
        let facade = facade_with(&backend);
        let logger = facade.get_logger("app");

        let v1 = facade.open_mapped_context("user", "v1", false);
        let v2 = facade.open_mapped_context("user", "v2", false);
        v1.release();
        assert_eq!(backend.mapped_value("user"), Some(json!("v2")));
        logger.info("inner").unwrap();
        v2.release();
        assert!(backend.mapped_value("user").is_none());

        assert_eq!(backend.records()[0].mapped.get("user"), Some(&json!("v2")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_get_logger_shares_binding() {
        let backend = MemLogBackend::modern();
        let facade = Arc::new(facade_with(&backend));

        let tasks: Vec<_> = (0..32)
            .map(|i| {
                let facade = Arc::clone(&facade);
                tokio::task::spawn_blocking(move || facade.get_logger(&format!("worker-{}", i)))
            })
            .collect();
        let mut loggers = Vec::new();
        for task in tasks {
            loggers.push(task.await.unwrap());
        }

        assert_eq!(facade.resolver().attempts(), 1);
        let first = loggers[0].binding().unwrap();
        for logger in &loggers {
            assert!(Arc::ptr_eq(first, logger.binding().unwrap()));
        }
    }

    #[test]
    fn test_from_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let modules = Arc::new(ModuleRegistry::new());
        MemLogBackend::modern().load_into(&modules);

        std::fs::write(&path, "disabled: true\n").unwrap();
        let facade =
            LogFacade::from_config_file(Arc::clone(&modules), &FileConfigSource::new(&path), Arc::new(NoOpSink::new()))
                .unwrap();
        assert!(facade.is_disabled());

        std::fs::write(&path, "disabled: [not, a, bool\n").unwrap();
        let error =
            LogFacade::from_config_file(modules, &FileConfigSource::new(&path), Arc::new(NoOpSink::new())).unwrap_err();
        assert!(matches!(error, LogError::Config(_)));
    }

    #[test]
    fn test_from_config() {
        let backend = MemLogBackend::modern();
        let modules = Arc::new(ModuleRegistry::new());
        backend.load_into(&modules);

        let config = FacadeConfig {
            disabled: true,
            providers: [(ProviderKind::Log, ProviderSettings { available: false })].into(),
            ..Default::default()
        };
        let facade = LogFacade::from_config(modules, &config, Arc::new(NoOpSink::new()));

        assert!(facade.is_disabled());
        assert!(!facade.is_provider_available(ProviderKind::Log));
        assert!(facade.is_provider_available(ProviderKind::MemLog));
        assert!(!facade.get_logger("app").info("muted").unwrap());
        assert!(facade.open_nested_context("x").is_noop());

        facade.set_disabled(false);
        assert!(facade.get_logger("app").info("heard").unwrap());
        assert_eq!(backend.records().len(), 1);
    }
}
