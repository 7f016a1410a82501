//! memlog: an in-memory logging back-end
//!
//! Records every enabled log call so tests (and applications that want to
//! inspect their own output) can assert on it. memlog publishes itself into a
//! module table and is only ever reached through it, exactly like a
//! third-party back-end.
//!
//! Two API generations are exported, selected by [`ApiShape`]:
//! - `Modern`: event API, native `{name}` templates, logical nested and scoped
//!   mapped contexts (the legacy context types are still present)
//! - `Legacy`: per-level methods only, string contexts with set/remove
//!
//! Members can be left out with [`MemLogOptions::omitted`] to simulate older
//! or broken releases.
//!
//! ```
//! use loglink_core::backends::memlog::MemLogBackend;
//! use loglink_core::modules::ModuleRegistry;
//!
//! let registry = ModuleRegistry::new();
//! let backend = MemLogBackend::modern();
//! backend.load_into(&registry);
//! assert!(registry.is_loaded("memlog"));
//! ```

mod context;

use std::any::Any;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::binding::members;
use crate::format::format_structured_message;
use crate::modules::{
    global_modules, Disposable, FlagPropertyFn, GetLoggerFn, GetStringFn, IsEnabledFn, LogEventFn, LogExceptionFn,
    LogMessageFn, LoggerNameFn, ModuleExports, ModuleRegistry, NewEventFn, Object, PushObjectFn, PushStringFn,
    RemoveFn, SetScopedFn, SetStringFn, StaticGetFn, TypeExports,
};
use crate::providers::MEMLOG_SURFACE;
use crate::value::{render_value, LogValue};
use crate::wrapper::describe_error;

/// memlog's own level set; more severe levels sort first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MemLevel {
    Off,
    Fatal,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl MemLevel {
    const EXPORTED: [MemLevel; 7] = [
        MemLevel::Trace,
        MemLevel::Debug,
        MemLevel::Info,
        MemLevel::Warn,
        MemLevel::Error,
        MemLevel::Fatal,
        MemLevel::Off,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MemLevel::Off => "Off",
            MemLevel::Fatal => "Fatal",
            MemLevel::Error => "Error",
            MemLevel::Warn => "Warn",
            MemLevel::Info => "Info",
            MemLevel::Debug => "Debug",
            MemLevel::Trace => "Trace",
        }
    }

    /// Whether a record at `self` passes a `threshold`
    pub fn passes(&self, threshold: MemLevel) -> bool {
        *self != MemLevel::Off && *self <= threshold
    }
}

/// Which API generation to export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiShape {
    #[default]
    Modern,
    Legacy,
}

/// Configuration for a memlog back-end
#[derive(Debug, Clone)]
pub struct MemLogOptions {
    pub shape: ApiShape,
    /// Least severe level that is recorded
    pub min_level: MemLevel,
    /// `ConfigurationItemFactory.parse_message_templates`; `None` means "auto" (on)
    pub parse_message_templates: Option<bool>,
    /// Export `<level>_exception` methods
    pub exception_methods: bool,
    /// Export the diagnostic context types
    pub contexts: bool,
    /// Types ("memlog.LogEventInfo") or members ("memlog.Logger.log_event") to leave out
    pub omitted: Vec<String>,
}

impl Default for MemLogOptions {
    fn default() -> Self {
        Self {
            shape: ApiShape::Modern,
            min_level: MemLevel::Trace,
            parse_message_templates: None,
            exception_methods: true,
            contexts: true,
            omitted: Vec::new(),
        }
    }
}

/// One recorded log call
#[derive(Debug, Clone, PartialEq)]
pub struct MemRecord {
    pub logger: String,
    pub level: MemLevel,
    /// Message as received (a template when args were passed along)
    pub message: String,
    /// Message after memlog rendered any template args
    pub rendered: String,
    pub args: Vec<LogValue>,
    /// Error chain of the attached exception
    pub exception: Option<String>,
    /// Mapped context at the time of the call
    pub mapped: BTreeMap<String, LogValue>,
    /// Nested context at the time of the call, outermost first
    pub nested: Vec<LogValue>,
}

static NEXT_BACKEND_ID: AtomicUsize = AtomicUsize::new(1);

struct Inner {
    id: usize,
    options: MemLogOptions,
    min_level: RwLock<MemLevel>,
    failing: AtomicBool,
    records: Mutex<Vec<MemRecord>>,
}

impl Inner {
    fn is_enabled(&self, level: MemLevel) -> bool {
        level.passes(*self.min_level.read())
    }

    fn record(
        &self,
        logger: &str,
        level: MemLevel,
        message: &str,
        args: &[LogValue],
        exception: Option<String>,
    ) {
        if self.failing.load(Ordering::Acquire) {
            panic!("memlog target failure");
        }
        if !self.is_enabled(level) {
            return;
        }
        let rendered = format_structured_message(message, args).message;
        self.records.lock().push(MemRecord {
            logger: logger.to_string(),
            level,
            message: message.to_string(),
            rendered,
            args: args.to_vec(),
            exception,
            mapped: context::mapped(self.id),
            nested: context::nested(self.id),
        });
    }
}

/// Logger instance handed out by `LogManager.get_logger`
struct MemLogger {
    name: String,
    inner: Arc<Inner>,
}

/// `LogEventInfo` instance
struct MemEvent {
    level: MemLevel,
    logger: String,
    message: String,
    args: Vec<LogValue>,
    exception: Option<String>,
}

/// `ConfigurationItemFactory.default`
struct MemConfigFactory {
    parse_message_templates: Option<bool>,
}

fn downcast<'a, T: Any>(object: &'a Object, what: &str) -> &'a T {
    match object.downcast_ref::<T>() {
        Some(value) => value,
        None => panic!("memlog: argument is not a {}", what),
    }
}

/// In-memory back-end
///
/// Cheap to clone; clones share records and settings.
#[derive(Clone)]
pub struct MemLogBackend {
    inner: Arc<Inner>,
}

impl MemLogBackend {
    pub fn new() -> Self {
        Self::with_options(MemLogOptions::default())
    }

    pub fn with_options(options: MemLogOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                id: NEXT_BACKEND_ID.fetch_add(1, Ordering::Relaxed),
                min_level: RwLock::new(options.min_level),
                options,
                failing: AtomicBool::new(false),
                records: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Current API generation with every capability
    pub fn modern() -> Self {
        Self::new()
    }

    /// Older API generation: per-level methods and string contexts
    pub fn legacy() -> Self {
        Self::with_options(MemLogOptions {
            shape: ApiShape::Legacy,
            ..Default::default()
        })
    }

    pub fn options(&self) -> &MemLogOptions {
        &self.inner.options
    }

    /// Publish into `registry`, replacing any earlier memlog module
    pub fn load_into(&self, registry: &ModuleRegistry) {
        registry.load(self.exports());
    }

    /// Publish into the process-wide module table
    pub fn load(&self) {
        self.load_into(&global_modules());
    }

    /// Snapshot of everything recorded so far
    pub fn records(&self) -> Vec<MemRecord> {
        self.inner.records.lock().clone()
    }

    pub fn clear(&self) {
        self.inner.records.lock().clear();
    }

    pub fn set_min_level(&self, level: MemLevel) {
        *self.inner.min_level.write() = level;
    }

    /// Make every write panic, as a broken target would
    pub fn set_failing(&self, failing: bool) {
        self.inner.failing.store(failing, Ordering::Release);
    }

    /// Mapped context value on the current thread
    pub fn mapped_value(&self, key: &str) -> Option<LogValue> {
        context::get_mapped(self.inner.id, key)
    }

    /// Nested context on the current thread, outermost first
    pub fn nested_values(&self) -> Vec<LogValue> {
        context::nested(self.inner.id)
    }

    /// Build the module exports for the configured shape
    pub fn exports(&self) -> ModuleExports {
        let options = &self.inner.options;
        let modern = options.shape == ApiShape::Modern;
        let mut exporter = Exporter::new(MEMLOG_SURFACE.module, &options.omitted);

        exporter.add(self.log_manager_type(&exporter));
        exporter.add(self.logger_type(&exporter, modern));
        exporter.add(level_type(&exporter));

        if modern {
            exporter.add(event_type(&exporter));
            exporter.add(self.config_factory_type(&exporter));
        }
        if options.contexts {
            exporter.add(self.nested_context_type(&exporter));
            exporter.add(self.mapped_context_type(&exporter));
            if modern {
                exporter.add(self.nested_logical_context_type(&exporter));
                exporter.add(self.mapped_logical_context_type(&exporter));
            }
        }
        exporter.finish()
    }

    fn log_manager_type(&self, exporter: &Exporter<'_>) -> TypeExports {
        let inner = Arc::clone(&self.inner);
        let get_logger: GetLoggerFn = Arc::new(move |name: &str| {
            Arc::new(MemLogger {
                name: name.to_string(),
                inner: Arc::clone(&inner),
            }) as Object
        });
        exporter.member(TypeExports::new(MEMLOG_SURFACE.log_manager), members::GET_LOGGER, get_logger)
    }

    fn logger_type(&self, exporter: &Exporter<'_>, modern: bool) -> TypeExports {
        let mut logger = TypeExports::new(MEMLOG_SURFACE.logger);

        let name: LoggerNameFn = Arc::new(|logger: &Object| downcast::<MemLogger>(logger, "Logger").name.clone());
        logger = exporter.member(logger, members::NAME, name);

        for level in MemLevel::EXPORTED.into_iter().filter(|l| *l != MemLevel::Off) {
            let is_enabled: IsEnabledFn = Arc::new(move |logger: &Object| {
                downcast::<MemLogger>(logger, "Logger").inner.is_enabled(level)
            });
            logger = exporter.member(logger, &members::is_enabled(level.name()), is_enabled);

            let log: LogMessageFn = Arc::new(move |logger: &Object, message: &str| {
                let logger = downcast::<MemLogger>(logger, "Logger");
                logger.inner.record(&logger.name, level, message, &[], None);
            });
            logger = exporter.member(logger, &members::log(level.name()), log);

            if self.inner.options.exception_methods {
                let log_exception: LogExceptionFn =
                    Arc::new(move |logger: &Object, message: &str, error: &(dyn Error + 'static)| {
                        let logger = downcast::<MemLogger>(logger, "Logger");
                        logger
                            .inner
                            .record(&logger.name, level, message, &[], Some(describe_error(error)));
                    });
                logger = exporter.member(logger, &members::log_exception(level.name()), log_exception);
            }
        }

        if modern {
            let log_event: LogEventFn = Arc::new(|logger: &Object, event: Object| {
                let logger = downcast::<MemLogger>(logger, "Logger");
                let event = downcast::<MemEvent>(&event, "LogEventInfo");
                logger.inner.record(
                    &event.logger,
                    event.level,
                    &event.message,
                    &event.args,
                    event.exception.clone(),
                );
            });
            logger = exporter.member(logger, members::LOG_EVENT, log_event);
        }
        logger
    }

    fn config_factory_type(&self, exporter: &Exporter<'_>) -> TypeExports {
        let type_name = MEMLOG_SURFACE
            .config_factory
            .unwrap_or("memlog.Config.ConfigurationItemFactory");
        let parse_message_templates = self.inner.options.parse_message_templates;
        let default: StaticGetFn = Arc::new(move || {
            Some(Arc::new(MemConfigFactory {
                parse_message_templates,
            }) as Object)
        });
        let flag: FlagPropertyFn = Arc::new(|factory: &Object| {
            downcast::<MemConfigFactory>(factory, "ConfigurationItemFactory").parse_message_templates
        });

        let factory = exporter.member(TypeExports::new(type_name), members::DEFAULT, default);
        exporter.member(factory, members::PARSE_MESSAGE_TEMPLATES, flag)
    }

    fn nested_context_type(&self, exporter: &Exporter<'_>) -> TypeExports {
        let backend = self.inner.id;
        let push: PushStringFn = Arc::new(move |text: &str| {
            context::push_nested(backend, LogValue::String(text.to_string()));
            Box::new(context::NestedPop { backend }) as Disposable
        });
        let type_name = MEMLOG_SURFACE.nested.unwrap_or("memlog.NestedDiagnosticsContext");
        exporter.member(TypeExports::new(type_name), members::PUSH, push)
    }

    fn nested_logical_context_type(&self, exporter: &Exporter<'_>) -> TypeExports {
        let backend = self.inner.id;
        let push_object: PushObjectFn = Arc::new(move |value: LogValue| {
            let entry = context::push_nested(backend, value);
            Box::new(context::NestedRemove { backend, entry }) as Disposable
        });
        let type_name = MEMLOG_SURFACE
            .nested_logical
            .unwrap_or("memlog.NestedDiagnosticsLogicalContext");
        exporter.member(TypeExports::new(type_name), members::PUSH_OBJECT, push_object)
    }

    fn mapped_context_type(&self, exporter: &Exporter<'_>) -> TypeExports {
        let backend = self.inner.id;
        let set: SetStringFn = Arc::new(move |key: &str, value: &str| {
            context::set_mapped(backend, key, LogValue::String(value.to_string()));
        });
        let remove: RemoveFn = Arc::new(move |key: &str| context::remove_mapped(backend, key));
        let get: GetStringFn = Arc::new(move |key: &str| {
            context::get_mapped(backend, key).map(|value| render_value(&value, false))
        });

        let type_name = MEMLOG_SURFACE.mapped.unwrap_or("memlog.MappedDiagnosticsContext");
        let mapped = exporter.member(TypeExports::new(type_name), members::SET, set);
        let mapped = exporter.member(mapped, members::REMOVE, remove);
        exporter.member(mapped, members::GET, get)
    }

    fn mapped_logical_context_type(&self, exporter: &Exporter<'_>) -> TypeExports {
        let backend = self.inner.id;
        let set_scoped: SetScopedFn = Arc::new(move |key: &str, value: LogValue| {
            let entry = context::set_scoped(backend, key, value);
            Box::new(context::MappedRestore {
                backend,
                key: key.to_string(),
                entry,
            }) as Disposable
        });
        let type_name = MEMLOG_SURFACE
            .mapped_logical
            .unwrap_or("memlog.MappedDiagnosticsLogicalContext");
        exporter.member(TypeExports::new(type_name), members::SET_SCOPED, set_scoped)
    }
}

impl Default for MemLogBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemLogBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemLogBackend")
            .field("id", &self.inner.id)
            .field("options", &self.inner.options)
            .field("records", &self.inner.records.lock().len())
            .finish()
    }
}

fn level_type(exporter: &Exporter<'_>) -> TypeExports {
    MemLevel::EXPORTED
        .into_iter()
        .fold(TypeExports::new(MEMLOG_SURFACE.level), |levels, level| {
            exporter.member(levels, level.name(), Arc::new(level) as Object)
        })
}

fn event_type(exporter: &Exporter<'_>) -> TypeExports {
    let type_name = MEMLOG_SURFACE.log_event.unwrap_or("memlog.LogEventInfo");
    let new_event: NewEventFn = Arc::new(
        |level: &Object,
         logger: &str,
         message: &str,
         args: Option<&[LogValue]>,
         error: Option<&(dyn Error + 'static)>| {
            Arc::new(MemEvent {
                level: *downcast::<MemLevel>(level, "LogLevel"),
                logger: logger.to_string(),
                message: message.to_string(),
                args: args.map(<[LogValue]>::to_vec).unwrap_or_default(),
                exception: error.map(describe_error),
            }) as Object
        },
    );
    exporter.member(TypeExports::new(type_name), members::NEW, new_event)
}

/// Assembles module exports, skipping anything listed as omitted
struct Exporter<'a> {
    omitted: &'a [String],
    module: Option<ModuleExports>,
}

impl<'a> Exporter<'a> {
    fn new(module: &str, omitted: &'a [String]) -> Self {
        Self {
            omitted,
            module: Some(ModuleExports::new(module)),
        }
    }

    fn is_omitted(&self, path: &str) -> bool {
        self.omitted.iter().any(|o| o == path)
    }

    fn member<S>(&self, exports: TypeExports, member: &str, value: S) -> TypeExports
    where
        S: Any + Send + Sync,
    {
        if self.is_omitted(&format!("{}.{}", exports.name(), member)) {
            exports
        } else {
            exports.with_member(member, value)
        }
    }

    fn add(&mut self, exports: TypeExports) {
        if self.is_omitted(exports.name()) {
            return;
        }
        self.module = self.module.take().map(|module| module.with_type(exports));
    }

    fn finish(self) -> ModuleExports {
        self.module.unwrap_or_else(|| ModuleExports::new(MEMLOG_SURFACE.module))
    }
}
