//! Capability binder
//!
//! Walks a back-end's [`Surface`] against the module table and produces a
//! [`ProviderBinding`]. Required capabilities fail the bind; optional ones are
//! recorded as absent. Where a capability has more than one tolerated shape,
//! shapes are tried in order and the first match wins.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use super::surface::{members, Surface};
use super::{Dispatch, LevelBinding, LevelMethods, ProviderBinding};
use crate::context::{LegacyMappedContext, MappedContextCapability, NestedContextCapability};
use crate::diagnostics::SharedSink;
use crate::error::{LogError, LogResult};
use crate::format::MessageFormatter;
use crate::level::LogLevel;
use crate::modules::{
    FlagPropertyFn, GetLoggerFn, GetStringFn, IsEnabledFn, LogEventFn, LogExceptionFn, LogMessageFn, LoggerNameFn,
    ModuleRegistry, NewEventFn, Object, PushObjectFn, PushStringFn, RemoveFn, SetScopedFn, SetStringFn, StaticGetFn,
    TypeExports,
};
use crate::providers::ProviderKind;
use crate::wrapper::{panic_message, ExecutionWrapper};
use crate::{diag_debug, diag_info};

/// Builds a `ProviderBinding` for one back-end
pub struct CapabilityBinder<'a> {
    modules: &'a ModuleRegistry,
    kind: ProviderKind,
    surface: &'static Surface,
    sink: SharedSink,
}

impl<'a> CapabilityBinder<'a> {
    pub fn new(modules: &'a ModuleRegistry, kind: ProviderKind, sink: SharedSink) -> Self {
        Self {
            modules,
            kind,
            surface: kind.surface(),
            sink,
        }
    }

    /// Locate every capability and assemble the binding
    pub fn bind(&self) -> LogResult<ProviderBinding> {
        let manager = self.require_type(self.surface.log_manager)?;
        let logger = self.require_type(self.surface.logger)?;
        let level_type = self.require_type(self.surface.level)?;

        let get_logger = self.require_member::<GetLoggerFn>(&manager, members::GET_LOGGER)?;
        let logger_name = logger.member::<LoggerNameFn>(members::NAME);
        if logger_name.is_none() {
            diag_debug!(self.sink, "{}: no {}.{}", self.kind, self.surface.logger, members::NAME);
        }

        let levels = self.bind_levels(&level_type, &logger)?;
        let dispatch = self.bind_dispatch(&logger, &levels)?;
        let native_templates = match dispatch {
            Dispatch::Event { .. } => self.native_templates()?,
            Dispatch::PerLevel(_) => false,
        };
        let nested_context = self.bind_nested_context();
        let mapped_context = self.bind_mapped_context();

        let binding = ProviderBinding {
            kind: self.kind,
            get_logger,
            get_logger_site: site(&manager, members::GET_LOGGER),
            logger_name,
            levels,
            dispatch,
            formatter: MessageFormatter::new(native_templates),
            nested_context,
            mapped_context,
            wrapper: ExecutionWrapper::new(Arc::clone(&self.sink)),
        };
        diag_info!(self.sink, "Bound {} back-end: {:?}", self.kind, binding);
        Ok(binding)
    }

    fn find_type(&self, type_name: &str) -> Option<Arc<TypeExports>> {
        self.modules.find_type(type_name, self.surface.module)
    }

    fn require_type(&self, type_name: &str) -> LogResult<Arc<TypeExports>> {
        self.find_type(type_name)
            .ok_or_else(|| self.failure(format!("type {} not found", type_name)))
    }

    fn require_member<S: Any + Clone>(&self, exports: &TypeExports, member: &str) -> LogResult<S> {
        exports.member::<S>(member).ok_or_else(|| {
            let found = exports.signatures_of(member);
            if found.is_empty() {
                self.failure(format!("{} not found", site(exports, member)))
            } else {
                self.failure(format!(
                    "{} has no overload of the expected signature (found {})",
                    site(exports, member),
                    found.join(", ")
                ))
            }
        })
    }

    fn failure(&self, reason: String) -> LogError {
        LogError::binding_failure(self.kind, reason)
    }

    fn bind_levels(&self, level_type: &TypeExports, logger: &TypeExports) -> LogResult<Vec<LevelBinding>> {
        LogLevel::ALL
            .iter()
            .map(|&level| -> LogResult<LevelBinding> {
                let candidates = self.surface.level_candidates(level);
                let (backend_name, token) = candidates
                    .iter()
                    .find_map(|name| level_type.member::<Object>(name).map(|token| (*name, token)))
                    .ok_or_else(|| {
                        self.failure(format!(
                            "no level constant for {} (tried {})",
                            level.name(),
                            candidates
                                .iter()
                                .map(|c| site(level_type, c))
                                .collect::<Vec<_>>()
                                .join(", ")
                        ))
                    })?;

                let enabled_member = members::is_enabled(backend_name);
                let is_enabled = self.require_member::<IsEnabledFn>(logger, &enabled_member)?;
                Ok(LevelBinding {
                    level,
                    backend_name,
                    token,
                    is_enabled,
                    enabled_site: site(logger, &enabled_member),
                })
            })
            .collect()
    }

    fn bind_dispatch(&self, logger: &TypeExports, levels: &[LevelBinding]) -> LogResult<Dispatch> {
        if let Some(dispatch) = self.match_event_dispatch(logger) {
            return Ok(dispatch);
        }
        diag_debug!(self.sink, "{}: no event API, using per-level methods", self.kind);

        let methods = levels
            .iter()
            .map(|level| -> LogResult<LevelMethods> {
                let log_member = members::log(level.backend_name);
                let exception_member = members::log_exception(level.backend_name);
                let log = self.require_member::<LogMessageFn>(logger, &log_member)?;
                let log_exception = logger.member::<LogExceptionFn>(&exception_member);
                if log_exception.is_none() {
                    diag_debug!(self.sink, "{}: no {}", self.kind, site(logger, &exception_member));
                }
                Ok(LevelMethods {
                    log,
                    log_exception,
                    site: site(logger, &log_member),
                    exception_site: site(logger, &exception_member),
                })
            })
            .collect::<LogResult<Vec<_>>>()?;
        Ok(Dispatch::PerLevel(methods))
    }

    fn match_event_dispatch(&self, logger: &TypeExports) -> Option<Dispatch> {
        let event_type = self.find_type(self.surface.log_event?)?;
        let new_event = event_type.member::<NewEventFn>(members::NEW)?;
        let log_event = logger.member::<LogEventFn>(members::LOG_EVENT)?;
        Some(Dispatch::Event {
            new_event,
            log_event,
            site: site(logger, members::LOG_EVENT),
        })
    }

    /// Read the back-end's own template switch
    ///
    /// On unless the property explicitly says `false`; off when the config
    /// type, its default instance or the property is missing.
    fn native_templates(&self) -> LogResult<bool> {
        let Some(factory_type) = self.surface.config_factory.and_then(|t| self.find_type(t)) else {
            return Ok(false);
        };
        let (Some(default), Some(flag)) = (
            factory_type.member::<StaticGetFn>(members::DEFAULT),
            factory_type.member::<FlagPropertyFn>(members::PARSE_MESSAGE_TEMPLATES),
        ) else {
            return Ok(false);
        };

        let read = catch_unwind(AssertUnwindSafe(|| default().map(|factory| flag(&factory))));
        match read {
            Ok(Some(parse)) => Ok(parse != Some(false)),
            Ok(None) => Ok(false),
            Err(payload) => Err(self.failure(format!(
                "reading {} failed: {}",
                site(&factory_type, members::PARSE_MESSAGE_TEMPLATES),
                panic_message(payload.as_ref())
            ))),
        }
    }

    fn bind_nested_context(&self) -> Option<NestedContextCapability> {
        let logical = self
            .surface
            .nested_logical
            .and_then(|t| self.find_type(t))
            .and_then(|t| {
                let push_object = t.member::<PushObjectFn>(members::PUSH_OBJECT)?;
                Some(NestedContextCapability::Logical {
                    push_object,
                    site: site(&t, members::PUSH_OBJECT).into(),
                })
            });
        if logical.is_some() {
            return logical;
        }

        let legacy = self.surface.nested.and_then(|t| self.find_type(t)).and_then(|t| {
            let push = t.member::<PushStringFn>(members::PUSH)?;
            Some(NestedContextCapability::Legacy {
                push,
                site: site(&t, members::PUSH).into(),
            })
        });
        if legacy.is_none() {
            diag_debug!(self.sink, "{}: no nested diagnostic context", self.kind);
        }
        legacy
    }

    fn bind_mapped_context(&self) -> Option<MappedContextCapability> {
        // The scoped shape only shipped alongside logical nesting
        let has_logical_nesting = self
            .surface
            .nested_logical
            .and_then(|t| self.find_type(t))
            .is_some_and(|t| t.member::<PushObjectFn>(members::PUSH_OBJECT).is_some());

        if has_logical_nesting {
            let scoped = self.surface.mapped_logical.and_then(|t| self.find_type(t)).and_then(|t| {
                let set_scoped = t.member::<SetScopedFn>(members::SET_SCOPED)?;
                Some(MappedContextCapability::Scoped {
                    set_scoped,
                    site: site(&t, members::SET_SCOPED).into(),
                })
            });
            if scoped.is_some() {
                return scoped;
            }
        }

        let legacy = self.surface.mapped.and_then(|t| self.find_type(t)).and_then(|t| {
            let set = t.member::<SetStringFn>(members::SET)?;
            let remove = t.member::<RemoveFn>(members::REMOVE)?;
            let get = t.member::<GetStringFn>(members::GET)?;
            Some(MappedContextCapability::Legacy(LegacyMappedContext::new(t.name(), set, remove, get)))
        });
        if legacy.is_none() {
            diag_debug!(self.sink, "{}: no mapped diagnostic context", self.kind);
        }
        legacy
    }
}

fn site(exports: &TypeExports, member: &str) -> String {
    format!("{}.{}", exports.name(), member)
}
