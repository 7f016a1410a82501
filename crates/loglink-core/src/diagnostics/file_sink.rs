//! File-based diagnostic sink for troubleshooting
//!
//! Useful when stderr isn't visible (services, GUI hosts).

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use parking_lot::Mutex;

use super::traits::DiagnosticSink;
use crate::level::LogLevel;

/// Appends timestamped diagnostics to a file
pub struct FileSink {
    path: PathBuf,
    file: Mutex<Option<File>>,
    min_level: LogLevel,
}

impl FileSink {
    /// Open (or create) the file for appending
    ///
    /// A file that cannot be opened leaves the sink silent.
    pub fn new(path: impl Into<PathBuf>, min_level: LogLevel) -> Self {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path).ok();
        Self {
            path,
            file: Mutex::new(file),
            min_level,
        }
    }

    /// Default diagnostics file in the temp directory
    pub fn default_path() -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push("loglink-diagnostics.log");
        path
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Truncate the file and reopen it
    pub fn clear(&self) {
        if let Ok(file) = File::create(&self.path) {
            drop(file);
        }
        *self.file.lock() = OpenOptions::new().create(true).append(true).open(&self.path).ok();
    }

    fn write(&self, level: LogLevel, message: &str) {
        if level < self.min_level {
            return;
        }

        let mut guard = self.file.lock();
        if let Some(file) = guard.as_mut() {
            let timestamp = SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .map(|d| {
                    let secs = d.as_secs();
                    let millis = d.subsec_millis();
                    let hours = (secs % 86400) / 3600;
                    let mins = (secs % 3600) / 60;
                    let secs = secs % 60;
                    format!("{:02}:{:02}:{:02}.{:03}", hours, mins, secs, millis)
                })
                .unwrap_or_else(|_| "??:??:??.???".to_string());

            let _ = writeln!(file, "[{}] [{}] {}", timestamp, level, message);
            let _ = file.flush();
        }
    }
}

impl std::fmt::Debug for FileSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSink")
            .field("path", &self.path)
            .field("min_level", &self.min_level)
            .finish()
    }
}

impl DiagnosticSink for FileSink {
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_writes_above_min_level() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("diag.log");
        let sink = FileSink::new(&path, LogLevel::Info);

        sink.debug("hidden");
        sink.info("resolved memlog");
        sink.error("fault");

        let content = fs::read_to_string(&path).unwrap();
        assert!(!content.contains("hidden"));
        assert!(content.contains("[INFO ] resolved memlog"));
        assert!(content.contains("[ERROR] fault"));
    }

    #[test]
    fn test_clear() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("diag.log");
        let sink = FileSink::new(&path, LogLevel::Trace);

        sink.warn("before");
        sink.clear();
        sink.warn("after");

        let content = fs::read_to_string(&path).unwrap();
        assert!(!content.contains("before"));
        assert!(content.contains("after"));
    }

    #[test]
    fn test_unopenable_path_is_silent() {
        let dir = tempdir().unwrap();
        // A directory cannot be opened for appending
        let sink = FileSink::new(dir.path(), LogLevel::Trace);
        sink.error("dropped");
    }
}
