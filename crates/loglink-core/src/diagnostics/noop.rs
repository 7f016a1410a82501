//! No-op diagnostic sink

use super::traits::DiagnosticSink;

/// A sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSink;

impl NoOpSink {
    pub fn new() -> Self {
        Self
    }
}

impl DiagnosticSink for NoOpSink {
    fn debug(&self, _message: &str) {}
    fn info(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_sink() {
        let sink = NoOpSink::new();

        // These should all do nothing without panicking
        sink.debug("debug message");
        sink.info("info message");
        sink.warn("warn message");
        sink.error("error message");
    }
}
