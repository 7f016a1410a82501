//! LogLink back-end for the `log` crate
//!
//! Publishes the `log` facade's surface into a LogLink module table so that
//! `loglink-core` can detect and bind it at runtime. Records go to whatever
//! `log::Log` implementation the application installed.
//!
//! ```no_run
//! loglink_log::load();
//! let logger = loglink_core::get_logger("app");
//! logger.info("hello").unwrap();
//! ```
//!
//! `log` has no fatal level (facade `Fatal` is written at `Error`) and no
//! template support, so the facade renders `{name}` placeholders itself.

mod context;

use std::error::Error;
use std::sync::Arc;

use log::{Level, Metadata, Record};

use loglink_core::binding::members;
use loglink_core::modules::{
    global_modules, Disposable, GetLoggerFn, GetStringFn, IsEnabledFn, LogEventFn, LogMessageFn, LoggerNameFn,
    ModuleExports, ModuleRegistry, NewEventFn, Object, PushStringFn, RemoveFn, SetStringFn, TypeExports,
};
use loglink_core::providers::LOG_SURFACE;
use loglink_core::value::LogValue;
use loglink_core::wrapper::describe_error;

/// Name the bridge registers under
pub const MODULE_NAME: &str = "log";

const LEVELS: [Level; 5] = [Level::Trace, Level::Debug, Level::Info, Level::Warn, Level::Error];

/// Logger object: `log` loggers are just targets
struct LogTarget {
    target: String,
}

/// Record object built by `Record.new`, emitted by `Logger.log_event`
struct PendingRecord {
    level: Level,
    target: String,
    message: String,
}

fn level_name(level: Level) -> &'static str {
    match level {
        Level::Trace => "Trace",
        Level::Debug => "Debug",
        Level::Info => "Info",
        Level::Warn => "Warn",
        Level::Error => "Error",
    }
}

fn target_of(logger: &Object) -> &str {
    match logger.downcast_ref::<LogTarget>() {
        Some(logger) => &logger.target,
        None => panic!("log bridge: argument is not a Logger"),
    }
}

fn is_enabled(level: Level, target: &str) -> bool {
    level <= log::max_level() && log::logger().enabled(&Metadata::builder().level(level).target(target).build())
}

fn emit(level: Level, target: &str, message: &str) {
    if !is_enabled(level, target) {
        return;
    }
    let suffix = context::suffix();
    log::logger().log(
        &Record::builder()
            .args(format_args!("{}{}", message, suffix))
            .level(level)
            .target(target)
            .build(),
    );
}

/// Build the module exports for the `log` crate
pub fn exports() -> ModuleExports {
    ModuleExports::new(MODULE_NAME)
        .with_type(logger_factory_type())
        .with_type(logger_type())
        .with_type(level_type())
        .with_type(record_type())
        .with_type(nested_context_type())
        .with_type(mapped_context_type())
}

/// Publish into `registry`
pub fn load_into(registry: &ModuleRegistry) {
    registry.load(exports());
}

/// Publish into the process-wide module table
pub fn load() {
    load_into(&global_modules());
}

fn logger_factory_type() -> TypeExports {
    let get_logger: GetLoggerFn = Arc::new(|name: &str| {
        Arc::new(LogTarget {
            target: name.to_string(),
        }) as Object
    });
    TypeExports::new(LOG_SURFACE.log_manager).with_member(members::GET_LOGGER, get_logger)
}

fn logger_type() -> TypeExports {
    let name: LoggerNameFn = Arc::new(|logger: &Object| target_of(logger).to_string());
    // The record already carries its target
    let log_event: LogEventFn = Arc::new(|_logger: &Object, record: Object| {
        let Some(record) = record.downcast_ref::<PendingRecord>() else {
            panic!("log bridge: argument is not a Record");
        };
        emit(record.level, &record.target, &record.message);
    });

    let mut logger = TypeExports::new(LOG_SURFACE.logger)
        .with_member(members::NAME, name)
        .with_member(members::LOG_EVENT, log_event);

    for level in LEVELS {
        let enabled: IsEnabledFn = Arc::new(move |logger: &Object| is_enabled(level, target_of(logger)));
        let log: LogMessageFn = Arc::new(move |logger: &Object, message: &str| emit(level, target_of(logger), message));
        logger = logger
            .with_member(&members::is_enabled(level_name(level)), enabled)
            .with_member(&members::log(level_name(level)), log);
    }
    logger
}

fn level_type() -> TypeExports {
    LEVELS
        .into_iter()
        .fold(TypeExports::new(LOG_SURFACE.level), |levels, level| {
            levels.with_member(level_name(level), Arc::new(level) as Object)
        })
}

fn record_type() -> TypeExports {
    let new_record: NewEventFn = Arc::new(
        |level: &Object,
         target: &str,
         message: &str,
         _args: Option<&[LogValue]>,
         error: Option<&(dyn Error + 'static)>| {
            let Some(level) = level.downcast_ref::<Level>() else {
                panic!("log bridge: argument is not a Level");
            };
            let message = match error {
                Some(error) => format!("{}: {}", message, describe_error(error)),
                None => message.to_string(),
            };
            Arc::new(PendingRecord {
                level: *level,
                target: target.to_string(),
                message,
            }) as Object
        },
    );
    let type_name = LOG_SURFACE.log_event.unwrap_or("log.Record");
    TypeExports::new(type_name).with_member(members::NEW, new_record)
}

fn nested_context_type() -> TypeExports {
    let push: PushStringFn = Arc::new(|text: &str| {
        context::push(text);
        Box::new(context::NestedPop) as Disposable
    });
    let type_name = LOG_SURFACE.nested.unwrap_or("log.NestedContext");
    TypeExports::new(type_name).with_member(members::PUSH, push)
}

fn mapped_context_type() -> TypeExports {
    let set: SetStringFn = Arc::new(|key: &str, value: &str| context::set(key, value));
    let remove: RemoveFn = Arc::new(|key: &str| context::remove(key));
    let get: GetStringFn = Arc::new(|key: &str| context::get(key));

    let type_name = LOG_SURFACE.mapped.unwrap_or("log.MappedContext");
    TypeExports::new(type_name)
        .with_member(members::SET, set)
        .with_member(members::REMOVE, remove)
        .with_member(members::GET, get)
}
