//! Console diagnostic sink

use super::traits::DiagnosticSink;
use crate::level::LogLevel;

/// A sink that writes to stderr
///
/// Diagnostics go to stderr only, so they never interleave with an
/// application's stdout.
#[derive(Debug, Clone)]
pub struct ConsoleSink {
    prefix: String,
    min_level: LogLevel,
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleSink {
    /// Create a console sink with the default prefix
    pub fn new() -> Self {
        Self {
            prefix: "[loglink]".to_string(),
            min_level: LogLevel::Debug,
        }
    }

    /// Create a console sink with a custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::new()
        }
    }

    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    fn write(&self, level: LogLevel, message: &str) {
        if level >= self.min_level {
            eprintln!("{} {}: {}", self.prefix, level, message);
        }
    }
}

impl DiagnosticSink for ConsoleSink {
    fn debug(&self, message: &str) {
        self.write(LogLevel::Debug, message);
    }

    fn info(&self, message: &str) {
        self.write(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.write(LogLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.write(LogLevel::Error, message);
    }
}
