//! Logger facade
//!
//! A [`Logger`] is a name plus whatever the one-time resolution produced: a
//! bound back-end logger, nothing (no-op), or the cached binding failure.

use std::error::Error;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::binding::{LoggerHandle, ProviderBinding};
use crate::error::{LogError, LogResult};
use crate::level::LogLevel;
use crate::providers::ProviderKind;
use crate::value::LogValue;
use crate::wrapper::panic_message;

/// Logged in place of a message whose producer panicked
pub const PRODUCER_FAILED_MESSAGE: &str = "Failed to generate log message";

/// A panic raised by a message producer
#[derive(Debug, thiserror::Error)]
#[error("message producer panicked: {0}")]
pub struct ProducerPanic(pub String);

#[derive(Debug, Clone)]
enum Target {
    NoOp,
    Bound(LoggerHandle),
    Failed(Arc<LogError>),
}

/// Named logger handed out by the facade
#[derive(Debug, Clone)]
pub struct Logger {
    name: Arc<str>,
    target: Target,
    disabled: Arc<AtomicBool>,
}

impl Logger {
    pub(crate) fn no_op(name: &str, disabled: Arc<AtomicBool>) -> Self {
        Self {
            name: Arc::from(name),
            target: Target::NoOp,
            disabled,
        }
    }

    pub(crate) fn bound(handle: LoggerHandle, disabled: Arc<AtomicBool>) -> Self {
        Self {
            name: Arc::from(handle.name()),
            target: Target::Bound(handle),
            disabled,
        }
    }

    pub(crate) fn failed(name: &str, cause: Arc<LogError>, disabled: Arc<AtomicBool>) -> Self {
        Self {
            name: Arc::from(name),
            target: Target::Failed(cause),
            disabled,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind of the back-end this logger writes to
    pub fn provider(&self) -> Option<ProviderKind> {
        self.binding().map(|binding| binding.kind())
    }

    pub fn binding(&self) -> Option<&Arc<ProviderBinding>> {
        match &self.target {
            Target::Bound(handle) => Some(handle.binding()),
            _ => None,
        }
    }

    /// Whether this logger writes nowhere (no back-end detected)
    pub fn is_no_op(&self) -> bool {
        matches!(self.target, Target::NoOp)
    }

    /// Level gate
    pub fn is_enabled(&self, level: LogLevel) -> LogResult<bool> {
        self.log(level, None, None, &[])
    }

    /// Log one message
    ///
    /// With no `producer` this only reports whether `level` is enabled. The
    /// producer runs only when the level is enabled. Returns whether a record
    /// reached the back-end; a back-end fault is reported on the diagnostics
    /// channel and yields `Ok(false)`. Once binding has failed every call
    /// returns the same cached cause.
    pub fn log(
        &self,
        level: LogLevel,
        producer: Option<&dyn Fn() -> String>,
        exception: Option<&(dyn Error + 'static)>,
        args: &[LogValue],
    ) -> LogResult<bool> {
        let handle = match &self.target {
            Target::Failed(cause) => return Err(LogError::initialization(Arc::clone(cause))),
            Target::NoOp => return Ok(false),
            Target::Bound(handle) => handle,
        };
        if self.disabled.load(Ordering::Relaxed) {
            return Ok(false);
        }

        let Some(producer) = producer else {
            return Ok(handle.is_enabled(level));
        };
        if !handle.is_enabled(level) {
            return Ok(false);
        }

        let template = match catch_unwind(AssertUnwindSafe(producer)) {
            Ok(template) => template,
            Err(payload) => {
                let error = ProducerPanic(panic_message(payload.as_ref()));
                if handle.is_enabled(LogLevel::Error) {
                    let _ = handle.write(LogLevel::Error, PRODUCER_FAILED_MESSAGE, &[], Some(&error));
                }
                return Ok(false);
            }
        };

        Ok(handle.write(level, &template, args, exception).is_ok())
    }

    pub fn trace(&self, message: &str) -> LogResult<bool> {
        self.log_message(LogLevel::Trace, message)
    }

    pub fn debug(&self, message: &str) -> LogResult<bool> {
        self.log_message(LogLevel::Debug, message)
    }

    pub fn info(&self, message: &str) -> LogResult<bool> {
        self.log_message(LogLevel::Info, message)
    }

    pub fn warn(&self, message: &str) -> LogResult<bool> {
        self.log_message(LogLevel::Warn, message)
    }

    pub fn error(&self, message: &str) -> LogResult<bool> {
        self.log_message(LogLevel::Error, message)
    }

    pub fn fatal(&self, message: &str) -> LogResult<bool> {
        self.log_message(LogLevel::Fatal, message)
    }

    fn log_message(&self, level: LogLevel, message: &str) -> LogResult<bool> {
        self.log(level, Some(&|| message.to_string()), None, &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::memlog::{ApiShape, MemLevel, MemLogBackend, MemLogOptions};
    use crate::binding::CapabilityBinder;
    use crate::diagnostics::CaptureSink;
    use crate::modules::ModuleRegistry;
    use serde_json::json;
    use std::cell::Cell;

    struct Fixture {
        backend: MemLogBackend,
        sink: Arc<CaptureSink>,
        disabled: Arc<AtomicBool>,
        binding: Arc<ProviderBinding>,
    }

    impl Fixture {
        fn new(options: MemLogOptions) -> Self {
            let registry = ModuleRegistry::new();
            let backend = MemLogBackend::with_options(options);
            backend.load_into(&registry);
            let sink = Arc::new(CaptureSink::new());
            let binding = CapabilityBinder::new(&registry, ProviderKind::MemLog, sink.clone())
                .bind()
                .unwrap();
            Self {
                backend,
                sink,
                disabled: Arc::new(AtomicBool::new(false)),
                binding: Arc::new(binding),
            }
        }

        fn logger(&self, name: &str) -> Logger {
            Logger::bound(self.binding.create_handle(name).unwrap(), Arc::clone(&self.disabled))
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("connection reset")]
    struct Reset;

    #[test]
    fn test_null_producer_matches_enablement() {
        let fixture = Fixture::new(MemLogOptions::default());
        fixture.backend.set_min_level(MemLevel::Warn);
        let logger = fixture.logger("app");

        for level in LogLevel::ALL {
            let expected = level >= LogLevel::Warn;
            assert_eq!(logger.log(level, None, None, &[]).unwrap(), expected, "{:?}", level);
        }
        assert!(fixture.backend.records().is_empty());
    }

    #[test]
    fn test_disabled_level_skips_producer() {
        let fixture = Fixture::new(MemLogOptions::default());
        fixture.backend.set_min_level(MemLevel::Info);
        let logger = fixture.logger("app");

        let called = Cell::new(false);
        let producer = || {
            called.set(true);
            "expensive".to_string()
        };
        assert!(!logger.log(LogLevel::Debug, Some(&producer), None, &[]).unwrap());
        assert!(!called.get());

        assert!(logger.log(LogLevel::Info, Some(&producer), None, &[]).unwrap());
        assert!(called.get());
    }

    #[test]
    fn test_native_templates_pass_args_through() {
        let fixture = Fixture::new(MemLogOptions::default());
        let logger = fixture.logger("app");

        assert!(logger
            .log(LogLevel::Info, Some(&|| "Hello {name}".to_string()), None, &[json!("World")])
            .unwrap());

        let record = &fixture.backend.records()[0];
        assert_eq!(record.message, "Hello {name}");
        assert_eq!(record.args, vec![json!("World")]);
        assert_eq!(record.rendered, "Hello World");
    }

    #[test]
    fn test_facade_renders_when_not_native() {
        let fixture = Fixture::new(MemLogOptions {
            parse_message_templates: Some(false),
            ..Default::default()
        });
        let logger = fixture.logger("app");

        logger
            .log(LogLevel::Info, Some(&|| "Hello {name}".to_string()), None, &[json!("World")])
            .unwrap();

        let record = &fixture.backend.records()[0];
        assert_eq!(record.message, "Hello World");
        assert!(record.args.is_empty());
    }

    #[test]
    fn test_exception_routes_to_exception_method() {
        let fixture = Fixture::new(MemLogOptions {
            shape: ApiShape::Legacy,
            ..Default::default()
        });
        let logger = fixture.logger("db");

        logger
            .log(LogLevel::Error, Some(&|| "query failed".to_string()), Some(&Reset), &[])
            .unwrap();
        logger.log(LogLevel::Error, Some(&|| "plain".to_string()), None, &[]).unwrap();

        let records = fixture.backend.records();
        assert_eq!(records[0].message, "query failed");
        assert_eq!(records[0].exception.as_deref(), Some("connection reset"));
        assert_eq!(records[1].exception, None);
    }

    #[test]
    fn test_exception_fallback_appends_error() {
        let fixture = Fixture::new(MemLogOptions {
            shape: ApiShape::Legacy,
            exception_methods: false,
            ..Default::default()
        });
        let logger = fixture.logger("db");

        assert!(logger
            .log(LogLevel::Warn, Some(&|| "retrying".to_string()), Some(&Reset), &[])
            .unwrap());

        let record = &fixture.backend.records()[0];
        assert!(record.message.starts_with("retrying"));
        assert!(record.message.contains("connection reset"));
        assert_eq!(record.exception, None);
    }

    #[test]
    fn test_event_carries_exception() {
        let fixture = Fixture::new(MemLogOptions::default());
        let logger = fixture.logger("db");

        logger
            .log(LogLevel::Fatal, Some(&|| "gone".to_string()), Some(&Reset), &[])
            .unwrap();
        let record = &fixture.backend.records()[0];
        assert_eq!(record.level, MemLevel::Fatal);
        assert_eq!(record.exception.as_deref(), Some("connection reset"));
    }

    #[test]
    fn test_backend_fault_contained() {
        let fixture = Fixture::new(MemLogOptions::default());
        let logger = fixture.logger("app");
        fixture.backend.set_failing(true);

        for _ in 0..3 {
            assert!(!logger.info("lost").unwrap());
        }
        assert_eq!(fixture.sink.count(LogLevel::Error, "memlog target failure"), 1);

        fixture.backend.set_failing(false);
        assert!(logger.info("back").unwrap());
        assert_eq!(fixture.sink.count(LogLevel::Warn, "2 more time(s)"), 1);
    }

    #[test]
    fn test_producer_panic_logged_as_error() {
        let fixture = Fixture::new(MemLogOptions::default());
        let logger = fixture.logger("app");

        let producer = || -> String { panic!("bad format") };
        assert!(!logger.log(LogLevel::Info, Some(&producer), None, &[]).unwrap());

        let records = fixture.backend.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, MemLevel::Error);
        assert_eq!(records[0].message, PRODUCER_FAILED_MESSAGE);
        assert!(records[0].exception.as_deref().unwrap().contains("bad format"));
    }

    #[test]
    fn test_failed_state_returns_cached_cause() {
        let cause = Arc::new(LogError::binding_failure(ProviderKind::MemLog, "missing"));
        let logger = Logger::failed("app", Arc::clone(&cause), Arc::new(AtomicBool::new(false)));

        for level in LogLevel::ALL {
            let err = logger.log(level, None, None, &[]).unwrap_err();
            assert!(Arc::ptr_eq(err.cause().unwrap(), &cause));
        }
        // Even the disabled switch does not hide a failed binding
        let disabled = Logger::failed("app", Arc::clone(&cause), Arc::new(AtomicBool::new(true)));
        assert!(disabled.info("x").is_err());
    }

    #[test]
    fn test_no_op_logger() {
        let logger = Logger::no_op("app", Arc::new(AtomicBool::new(false)));
        assert!(logger.is_no_op());
        assert!(logger.provider().is_none());
        assert!(!logger.is_enabled(LogLevel::Fatal).unwrap());
        assert!(!logger.fatal("nobody listens").unwrap());
    }

    #[test]
    fn test_disabled_switch() {
        let fixture = Fixture::new(MemLogOptions::default());
        let logger = fixture.logger("app");

        fixture.disabled.store(true, Ordering::Relaxed);
        assert!(!logger.error("muted").unwrap());
        assert!(!logger.is_enabled(LogLevel::Error).unwrap());

        fixture.disabled.store(false, Ordering::Relaxed);
        assert!(logger.error("heard").unwrap());
        assert_eq!(fixture.backend.records().len(), 1);
    }
}
