//! Provider detection and one-time binding
//!
//! The first caller that needs a back-end runs detection and the binder; every
//! other caller (concurrent or later) sees the memoized [`Resolution`]. A
//! failed bind is cached like a success and never retried.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;

use super::ProviderKind;
use crate::binding::{CapabilityBinder, ProviderBinding};
use crate::diagnostics::{NoOpSink, SharedSink};
use crate::error::{LogError, LogResult};
use crate::modules::ModuleRegistry;
use crate::{diag_debug, diag_error, diag_info};

/// Memoized outcome of resolution
#[derive(Debug, Clone)]
pub enum Resolution {
    /// A back-end was detected and bound
    Bound(Arc<ProviderBinding>),
    /// No supported back-end is loaded
    Absent,
    /// The detected back-end could not be bound
    Failed(Arc<LogError>),
}

impl Resolution {
    /// The binding, or why there is none
    pub fn binding(&self) -> LogResult<Arc<ProviderBinding>> {
        match self {
            Resolution::Bound(binding) => Ok(Arc::clone(binding)),
            Resolution::Absent => Err(LogError::ProviderNotFound),
            Resolution::Failed(cause) => Err(LogError::initialization(Arc::clone(cause))),
        }
    }

    /// Kind of the bound back-end
    pub fn provider(&self) -> Option<ProviderKind> {
        match self {
            Resolution::Bound(binding) => Some(binding.kind()),
            _ => None,
        }
    }
}

/// Lifecycle of the one-time initialization
#[derive(Debug, Clone)]
pub enum InitializationState {
    NotStarted,
    Succeeded,
    Failed(Arc<LogError>),
}

/// Detects the loaded back-end and binds it exactly once
pub struct ProviderResolver {
    modules: Arc<ModuleRegistry>,
    sink: SharedSink,
    preferred: Option<ProviderKind>,
    available: [AtomicBool; 2],
    attempts: AtomicUsize,
    resolution: OnceCell<Resolution>,
}

impl ProviderResolver {
    pub fn new(modules: Arc<ModuleRegistry>) -> Self {
        Self {
            modules,
            sink: Arc::new(NoOpSink::new()),
            preferred: None,
            available: [AtomicBool::new(true), AtomicBool::new(true)],
            attempts: AtomicUsize::new(0),
            resolution: OnceCell::new(),
        }
    }

    /// Send detection decisions and back-end faults to `sink`
    pub fn with_sink(mut self, sink: SharedSink) -> Self {
        self.sink = sink;
        self
    }

    /// Only consider `kind`
    pub fn with_preferred(mut self, kind: Option<ProviderKind>) -> Self {
        self.preferred = kind;
        self
    }

    /// Availability override for `kind`
    ///
    /// Only consulted during detection; changing it after resolution has no
    /// effect.
    pub fn set_available(&self, kind: ProviderKind, available: bool) {
        self.available[kind.index()].store(available, Ordering::Release);
    }

    pub fn is_available(&self, kind: ProviderKind) -> bool {
        self.available[kind.index()].load(Ordering::Acquire)
    }

    pub fn modules(&self) -> &Arc<ModuleRegistry> {
        &self.modules
    }

    /// First candidate whose marker type is loaded and not overridden off
    pub fn detect(&self) -> Option<ProviderKind> {
        ProviderKind::ALL
            .into_iter()
            .filter(|kind| self.preferred.map_or(true, |preferred| preferred == *kind))
            .find(|kind| {
                let surface = kind.surface();
                if !self.is_available(*kind) {
                    diag_debug!(self.sink, "{} back-end disabled by override", kind);
                    return false;
                }
                self.modules.find_type(surface.log_manager, surface.module).is_some()
            })
    }

    /// Resolve on first call; later calls return the cached outcome
    pub fn resolve(&self) -> &Resolution {
        self.resolution.get_or_init(|| self.run())
    }

    /// The cached outcome without triggering resolution
    pub fn resolution(&self) -> Option<&Resolution> {
        self.resolution.get()
    }

    pub fn state(&self) -> InitializationState {
        match self.resolution.get() {
            None => InitializationState::NotStarted,
            Some(Resolution::Failed(cause)) => InitializationState::Failed(Arc::clone(cause)),
            Some(_) => InitializationState::Succeeded,
        }
    }

    /// How many times the binder has run (never more than one)
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::Acquire)
    }

    fn run(&self) -> Resolution {
        let Some(kind) = self.detect() else {
            diag_info!(self.sink, "No supported logging back-end found; logging is a no-op");
            return Resolution::Absent;
        };

        self.attempts.fetch_add(1, Ordering::AcqRel);
        diag_debug!(self.sink, "Detected {} back-end", kind);
        match CapabilityBinder::new(&self.modules, kind, Arc::clone(&self.sink)).bind() {
            Ok(binding) => Resolution::Bound(Arc::new(binding)),
            Err(e) => {
                diag_error!(self.sink, "{}", e);
                Resolution::Failed(Arc::new(e))
            }
        }
    }
}

impl std::fmt::Debug for ProviderResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderResolver")
            .field("preferred", &self.preferred)
            .field("attempts", &self.attempts())
            .field("resolution", &self.resolution.get())
            .finish()
    }
}
