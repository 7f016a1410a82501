//! Diagnostic sink trait definition

use std::sync::Arc;

/// Side channel for the facade's own diagnostics
///
/// The facade reports resolution decisions, binding failures and contained
/// back-end faults here, never through the back-end it is adapting.
///
/// Implementations:
/// - `NoOpSink`: Silent sink (default)
/// - `ConsoleSink`: Writes to stderr
/// - `FileSink`: Appends to a file
/// - `CaptureSink`: Keeps entries in memory for tests
pub trait DiagnosticSink: Send + Sync {
    /// Log a debug message
    fn debug(&self, message: &str);

    /// Log an info message
    fn info(&self, message: &str);

    /// Log a warning message
    fn warn(&self, message: &str);

    /// Log an error message
    fn error(&self, message: &str);
}

/// Type alias for an Arc-wrapped sink
pub type SharedSink = Arc<dyn DiagnosticSink>;

/// Convenience macros for writing to a sink
#[macro_export]
macro_rules! diag_debug {
    ($sink:expr, $($arg:tt)*) => {
        $sink.debug(&format!($($arg)*))
    };
}

#[macro_export]
macro_rules! diag_info {
    ($sink:expr, $($arg:tt)*) => {
        $sink.info(&format!($($arg)*))
    };
}

#[macro_export]
macro_rules! diag_warn {
    ($sink:expr, $($arg:tt)*) => {
        $sink.warn(&format!($($arg)*))
    };
}

#[macro_export]
macro_rules! diag_error {
    ($sink:expr, $($arg:tt)*) => {
        $sink.error(&format!($($arg)*))
    };
}
