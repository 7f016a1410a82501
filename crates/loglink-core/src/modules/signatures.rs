//! Member signatures a back-end may export
//!
//! A member is only found when it was exported as exactly one of these types,
//! so back-ends must coerce their closures to the alias (e.g.
//! `Arc::new(|name: &str| ...) as GetLoggerFn`).

use std::any::Any;
use std::error::Error;
use std::sync::Arc;

use serde_json::Value;

/// Opaque back-end value (logger instance, level constant, event, ...)
pub type Object = Arc<dyn Any + Send + Sync>;

/// Returned by context pushes; dropping it undoes the push
pub type Disposable = Box<dyn Any>;

/// `LogManager.get_logger(name)`
pub type GetLoggerFn = Arc<dyn Fn(&str) -> Object + Send + Sync>;

/// `Logger.name`
pub type LoggerNameFn = Arc<dyn Fn(&Object) -> String + Send + Sync>;

/// `Logger.is_<level>_enabled`
pub type IsEnabledFn = Arc<dyn Fn(&Object) -> bool + Send + Sync>;

/// `Logger.<level>(message)`
pub type LogMessageFn = Arc<dyn Fn(&Object, &str) + Send + Sync>;

/// `Logger.<level>_exception(message, error)`
pub type LogExceptionFn = Arc<dyn Fn(&Object, &str, &(dyn Error + 'static)) + Send + Sync>;

/// `LogEventInfo.new(level, logger_name, message, args, error)`
pub type NewEventFn = Arc<
    dyn Fn(&Object, &str, &str, Option<&[Value]>, Option<&(dyn Error + 'static)>) -> Object
        + Send
        + Sync,
>;

/// `Logger.log_event(event)`
pub type LogEventFn = Arc<dyn Fn(&Object, Object) + Send + Sync>;

/// Static property getter (e.g. `ConfigurationItemFactory.default`)
pub type StaticGetFn = Arc<dyn Fn() -> Option<Object> + Send + Sync>;

/// Nullable boolean instance property (e.g. `parse_message_templates`)
pub type FlagPropertyFn = Arc<dyn Fn(&Object) -> Option<bool> + Send + Sync>;

/// `NestedDiagnosticsLogicalContext.push_object(value)`
pub type PushObjectFn = Arc<dyn Fn(Value) -> Disposable + Send + Sync>;

/// `NestedDiagnosticsContext.push(text)`
pub type PushStringFn = Arc<dyn Fn(&str) -> Disposable + Send + Sync>;

/// `MappedDiagnosticsLogicalContext.set_scoped(key, value)`
pub type SetScopedFn = Arc<dyn Fn(&str, Value) -> Disposable + Send + Sync>;

/// `MappedDiagnosticsContext.set(key, value)`
pub type SetStringFn = Arc<dyn Fn(&str, &str) + Send + Sync>;

/// `MappedDiagnosticsContext.remove(key)`
pub type RemoveFn = Arc<dyn Fn(&str) + Send + Sync>;

/// `MappedDiagnosticsContext.get(key)`
pub type GetStringFn = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;
