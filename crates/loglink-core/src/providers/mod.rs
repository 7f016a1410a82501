//! Supported logging back-ends
//!
//! Each back-end is described by a static [`Surface`]: where its types live in
//! the module table and how its levels are named. Detection and binding only
//! ever go through these tables, never through a compile-time dependency.
//!
//! Candidates are probed in [`ProviderKind::ALL`] order; the first one whose
//! marker type is loaded (and not overridden off) wins.

mod resolver;

pub use resolver::{InitializationState, ProviderResolver, Resolution};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::binding::Surface;

/// A supported back-end
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// In-memory back-end shipped with this crate
    MemLog,
    /// The `log` crate, exported by `loglink-log`
    Log,
}

impl ProviderKind {
    /// Every kind, in detection priority order
    pub const ALL: [ProviderKind; 2] = [ProviderKind::MemLog, ProviderKind::Log];

    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::MemLog => "memlog",
            ProviderKind::Log => "log",
        }
    }

    /// Probe table for this back-end
    pub fn surface(&self) -> &'static Surface {
        match self {
            ProviderKind::MemLog => &MEMLOG_SURFACE,
            ProviderKind::Log => &LOG_SURFACE,
        }
    }

    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned for an unknown provider name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown logging provider: {0}")]
pub struct ParseProviderError(pub String);

impl FromStr for ProviderKind {
    type Err = ParseProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseProviderError(s.to_string()))
    }
}

/// memlog: both API shapes live under the same type names
pub static MEMLOG_SURFACE: Surface = Surface {
    module: "memlog",
    log_manager: "memlog.LogManager",
    logger: "memlog.Logger",
    level: "memlog.LogLevel",
    log_event: Some("memlog.LogEventInfo"),
    config_factory: Some("memlog.Config.ConfigurationItemFactory"),
    nested_logical: Some("memlog.NestedDiagnosticsLogicalContext"),
    nested: Some("memlog.NestedDiagnosticsContext"),
    mapped_logical: Some("memlog.MappedDiagnosticsLogicalContext"),
    mapped: Some("memlog.MappedDiagnosticsContext"),
    level_aliases: [
        &["Trace"],
        &["Debug"],
        &["Info"],
        &["Warn"],
        &["Error"],
        &["Fatal"],
    ],
};

/// log: no fatal level, no native templates, string contexts only
pub static LOG_SURFACE: Surface = Surface {
    module: "log",
    log_manager: "log.LoggerFactory",
    logger: "log.Logger",
    level: "log.Level",
    log_event: Some("log.Record"),
    config_factory: None,
    nested_logical: None,
    nested: Some("log.NestedContext"),
    mapped_logical: None,
    mapped: Some("log.MappedContext"),
    level_aliases: [
        &["Trace"],
        &["Debug"],
        &["Info"],
        &["Warn"],
        &["Error"],
        &["Fatal", "Error"],
    ],
};
