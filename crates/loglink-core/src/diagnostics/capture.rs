//! In-memory diagnostic sink

use parking_lot::Mutex;

use super::traits::DiagnosticSink;
use crate::level::LogLevel;

/// A captured diagnostic entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedDiagnostic {
    pub level: LogLevel,
    pub message: String,
}

/// Keeps diagnostics in memory so tests can assert on them
#[derive(Debug, Default)]
pub struct CaptureSink {
    entries: Mutex<Vec<CapturedDiagnostic>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all captured entries
    pub fn entries(&self) -> Vec<CapturedDiagnostic> {
        self.entries.lock().clone()
    }

    /// Count entries at `level` whose message contains `needle`
    pub fn count(&self, level: LogLevel, needle: &str) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.level == level && e.message.contains(needle))
            .count()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    fn push(&self, level: LogLevel, message: &str) {
        self.entries.lock().push(CapturedDiagnostic {
            level,
            message: message.to_string(),
        });
    }
}

impl DiagnosticSink for CaptureSink {
    fn debug(&self, message: &str) {
        self.push(LogLevel::Debug, message);
    }

    fn info(&self, message: &str) {
        self.push(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.push(LogLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.push(LogLevel::Error, message);
    }
}
