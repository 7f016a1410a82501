//! LogLink Core
//!
//! A logging facade that adapts at runtime to whichever logging back-end is
//! loaded into the process. Back-ends publish their API into a module table;
//! on first use the facade detects one, binds the capabilities it needs once,
//! and from then on only calls cached closures.
//!
//! ```rust
//! use std::sync::Arc;
//! use loglink_core::backends::memlog::MemLogBackend;
//! use loglink_core::modules::ModuleRegistry;
//! use loglink_core::{LogFacade, LogLevel};
//!
//! let modules = Arc::new(ModuleRegistry::new());
//! let backend = MemLogBackend::modern();
//! backend.load_into(&modules);
//!
//! let facade = LogFacade::new(modules);
//! let logger = facade.get_logger("checkout");
//! let _user = facade.open_mapped_context("user", "ann", false);
//!
//! let args = [serde_json::json!(3)];
//! logger
//!     .log(LogLevel::Info, Some(&|| "Bought {count} items".to_string()), None, &args)
//!     .unwrap();
//! assert_eq!(backend.records()[0].rendered, "Bought 3 items");
//! ```
//!
//! ## Modules
//!
//! - `modules`: the module table back-ends publish into
//! - `providers`: supported back-ends and the one-time resolver
//! - `binding`: capability binder and the cached `ProviderBinding`
//! - `format`: `{name}` template rendering
//! - `context`: nested and mapped diagnostic context scopes
//! - `wrapper`: containment of back-end panics
//! - `diagnostics`: the facade's own side channel
//! - `config`: YAML file and environment configuration

pub mod backends;
pub mod binding;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod facade;
pub mod format;
pub mod level;
pub mod logger;
pub mod modules;
pub mod providers;
pub mod value;
pub mod wrapper;

pub use binding::{CapabilityBinder, DispatchShape, LoggerHandle, ProviderBinding};
pub use config::{FacadeConfig, FileConfigSource};
pub use context::{ContextShape, ScopeGuard};
pub use diagnostics::{
    set_diagnostic_sink, CaptureSink, ConsoleSink, DiagnosticSink, FileSink, NoOpSink, SharedSink,
};
pub use error::{BackendFault, LogError, LogResult};
pub use facade::{
    current_provider, get_logger, initialization_state, is_disabled, open_mapped_context,
    open_nested_context, set_disabled, set_provider_available, LogFacade,
};
pub use format::{format_structured_message, FormattedMessage, MessageFormatter};
pub use level::LogLevel;
pub use logger::Logger;
pub use modules::{find_type, load_module, unload_module, ModuleExports, ModuleRegistry, TypeExports};
pub use providers::{InitializationState, ProviderKind, ProviderResolver, Resolution};
pub use value::LogValue;
pub use wrapper::ExecutionWrapper;
