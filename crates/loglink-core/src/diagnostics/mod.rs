//! Diagnostics side channel for the facade itself

mod capture;
mod console;
mod file_sink;
mod noop;
mod traits;

pub use capture::{CaptureSink, CapturedDiagnostic};
pub use console::ConsoleSink;
pub use file_sink::FileSink;
pub use noop::NoOpSink;
pub use traits::{DiagnosticSink, SharedSink};

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

/// Process-wide sink used by the global facade
static GLOBAL_SINK: Lazy<RwLock<SharedSink>> = Lazy::new(|| RwLock::new(Arc::new(NoOpSink::new())));

/// Replace the process-wide diagnostic sink
pub fn set_diagnostic_sink(sink: SharedSink) {
    *GLOBAL_SINK.write() = sink;
}

/// The current process-wide diagnostic sink
pub fn diagnostic_sink() -> SharedSink {
    Arc::clone(&GLOBAL_SINK.read())
}

/// Forwards to whatever process-wide sink is current at call time
///
/// Handed to the global resolver so that a sink installed after the facade is
/// built still receives fault reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalSink;

impl DiagnosticSink for GlobalSink {
    fn debug(&self, message: &str) {
        diagnostic_sink().debug(message);
    }

    fn info(&self, message: &str) {
        diagnostic_sink().info(message);
    }

    fn warn(&self, message: &str) {
        diagnostic_sink().warn(message);
    }

    fn error(&self, message: &str) {
        diagnostic_sink().error(message);
    }
}
