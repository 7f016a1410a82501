//! Bound back-end capabilities
//!
//! A [`ProviderBinding`] is built once by the [`CapabilityBinder`] and never
//! changes afterwards. Every member it holds was found by name and signature
//! at bind time; the hot path only calls cached `Arc`s.

mod binder;
mod surface;

pub use binder::CapabilityBinder;
pub use surface::{members, Surface};

use std::error::Error;
use std::sync::Arc;

use crate::context::{ContextShape, MappedContextCapability, NestedContextCapability, ScopeGuard};
use crate::error::BackendFault;
use crate::format::MessageFormatter;
use crate::level::LogLevel;
use crate::modules::{
    GetLoggerFn, IsEnabledFn, LogEventFn, LogExceptionFn, LogMessageFn, LoggerNameFn, NewEventFn, Object,
};
use crate::providers::ProviderKind;
use crate::value::LogValue;
use crate::wrapper::{describe_error, ExecutionWrapper};

/// One facade level resolved against the back-end
pub struct LevelBinding {
    level: LogLevel,
    backend_name: &'static str,
    token: Object,
    is_enabled: IsEnabledFn,
    enabled_site: String,
}

impl LevelBinding {
    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Name of the back-end level constant this level maps to
    pub fn backend_name(&self) -> &'static str {
        self.backend_name
    }

    /// The back-end level constant
    pub fn token(&self) -> &Object {
        &self.token
    }
}

/// Per-level log methods for back-ends without an event API
pub struct LevelMethods {
    log: LogMessageFn,
    log_exception: Option<LogExceptionFn>,
    site: String,
    exception_site: String,
}

/// How a record reaches the back-end
pub enum Dispatch {
    /// Build an event object, then hand it to the logger
    Event {
        new_event: NewEventFn,
        log_event: LogEventFn,
        site: String,
    },
    /// One method per level, indexed by facade level
    PerLevel(Vec<LevelMethods>),
}

/// Which dispatch shape a binding uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchShape {
    Event,
    PerLevel,
}

/// Everything the facade needs from one back-end
pub struct ProviderBinding {
    kind: ProviderKind,
    get_logger: GetLoggerFn,
    get_logger_site: String,
    logger_name: Option<LoggerNameFn>,
    levels: Vec<LevelBinding>,
    dispatch: Dispatch,
    formatter: MessageFormatter,
    nested_context: Option<NestedContextCapability>,
    mapped_context: Option<MappedContextCapability>,
    wrapper: ExecutionWrapper,
}

impl ProviderBinding {
    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    /// Back-end level constant for `level`
    pub fn translate(&self, level: LogLevel) -> &Object {
        &self.levels[level.index()].token
    }

    /// Back-end level name for `level` (e.g. "Error" for `Fatal` on `log`)
    pub fn backend_level_name(&self, level: LogLevel) -> &'static str {
        self.levels[level.index()].backend_name
    }

    pub fn level_binding(&self, level: LogLevel) -> &LevelBinding {
        &self.levels[level.index()]
    }

    pub fn dispatch_shape(&self) -> DispatchShape {
        match self.dispatch {
            Dispatch::Event { .. } => DispatchShape::Event,
            Dispatch::PerLevel(_) => DispatchShape::PerLevel,
        }
    }

    /// Whether every level has a native log-with-exception method
    ///
    /// Always false for the event shape, which carries the error on the event.
    pub fn has_exception_methods(&self) -> bool {
        match &self.dispatch {
            Dispatch::Event { .. } => false,
            Dispatch::PerLevel(methods) => methods.iter().all(|m| m.log_exception.is_some()),
        }
    }

    pub fn formatter(&self) -> MessageFormatter {
        self.formatter
    }

    /// Whether the back-end renders `{name}` templates itself
    pub fn structured_logging_enabled(&self) -> bool {
        self.formatter.native_templates()
    }

    pub fn has_logger_name(&self) -> bool {
        self.logger_name.is_some()
    }

    pub fn nested_context_shape(&self) -> Option<ContextShape> {
        self.nested_context.as_ref().map(NestedContextCapability::shape)
    }

    pub fn mapped_context_shape(&self) -> Option<ContextShape> {
        self.mapped_context.as_ref().map(MappedContextCapability::shape)
    }

    pub fn wrapper(&self) -> &ExecutionWrapper {
        &self.wrapper
    }

    /// Obtain a back-end logger; `None` if the back-end faulted
    pub fn create_handle(self: &Arc<Self>, name: &str) -> Option<LoggerHandle> {
        let logger = self
            .wrapper
            .invoke(&self.get_logger_site, || (self.get_logger)(name))
            .ok()?;
        Some(LoggerHandle {
            logger,
            name: name.to_string(),
            binding: Arc::clone(self),
        })
    }

    /// Push onto the nested context; no-op guard if the back-end has none
    pub fn open_nested(&self, value: LogValue) -> ScopeGuard {
        match &self.nested_context {
            Some(nested) => nested.open(&self.wrapper, value),
            None => ScopeGuard::noop(),
        }
    }

    /// Set a mapped context entry; no-op guard if the back-end has none
    pub fn open_mapped(&self, key: &str, value: LogValue, destructure: bool) -> ScopeGuard {
        match &self.mapped_context {
            Some(mapped) => mapped.open(&self.wrapper, key, value, destructure),
            None => ScopeGuard::noop(),
        }
    }
}

impl std::fmt::Debug for ProviderBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let levels: Vec<_> = self.levels.iter().map(|l| (l.level, l.backend_name)).collect();
        f.debug_struct("ProviderBinding")
            .field("kind", &self.kind)
            .field("levels", &levels)
            .field("dispatch", &self.dispatch_shape())
            .field("native_templates", &self.formatter.native_templates())
            .field("nested_context", &self.nested_context)
            .field("mapped_context", &self.mapped_context)
            .finish()
    }
}

/// A back-end logger instance plus the binding that drives it
#[derive(Clone)]
pub struct LoggerHandle {
    logger: Object,
    name: String,
    binding: Arc<ProviderBinding>,
}

impl LoggerHandle {
    /// Name the logger was requested with
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name reported by the back-end, when it exposes one
    pub fn backend_name(&self) -> Option<String> {
        let accessor = self.binding.logger_name.as_ref()?;
        let site = format!("{}.{}", self.binding.kind.surface().logger, members::NAME);
        self.binding.wrapper.invoke(&site, || accessor(&self.logger)).ok()
    }

    pub fn binding(&self) -> &Arc<ProviderBinding> {
        &self.binding
    }

    /// Back-end logger object
    pub fn object(&self) -> &Object {
        &self.logger
    }

    /// Level gate; a faulting check counts as disabled
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        let level = self.binding.level_binding(level);
        self.binding
            .wrapper
            .invoke(&level.enabled_site, || (level.is_enabled)(&self.logger))
            .unwrap_or(false)
    }

    /// Format and send one record
    pub fn write(
        &self,
        level: LogLevel,
        template: &str,
        args: &[LogValue],
        exception: Option<&(dyn Error + 'static)>,
    ) -> Result<(), BackendFault> {
        let binding = &*self.binding;
        let formatted = binding.formatter.format(template, args);

        match &binding.dispatch {
            Dispatch::Event {
                new_event,
                log_event,
                site,
            } => {
                // Native templates keep the args for the back-end to render
                let event_args = (binding.formatter.native_templates() && !args.is_empty()).then_some(args);
                let token = binding.translate(level);
                binding.wrapper.invoke(site, || {
                    let event = new_event(token, &self.name, &formatted.message, event_args, exception);
                    log_event(&self.logger, event)
                })
            }
            Dispatch::PerLevel(methods) => {
                let methods = &methods[level.index()];
                match (exception, &methods.log_exception) {
                    (Some(error), Some(log_exception)) => binding
                        .wrapper
                        .invoke(&methods.exception_site, || {
                            log_exception(&self.logger, &formatted.message, error)
                        }),
                    (Some(error), None) => {
                        let message = format!("{}\n{}", formatted.message, describe_error(error));
                        binding
                            .wrapper
                            .invoke(&methods.site, || (methods.log)(&self.logger, &message))
                    }
                    (None, _) => binding
                        .wrapper
                        .invoke(&methods.site, || (methods.log)(&self.logger, &formatted.message)),
                }
            }
        }
    }
}

impl std::fmt::Debug for LoggerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerHandle")
            .field("name", &self.name)
            .field("provider", &self.binding.kind)
            .finish()
    }
}
