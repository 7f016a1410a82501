//! Facade error types

use std::sync::Arc;

use thiserror::Error;

use crate::config::ConfigError;
use crate::providers::ProviderKind;

/// A panic or failure raised inside a back-end call
///
/// Faults never reach application code; the execution wrapper reports them on
/// the diagnostics side channel and the log call returns `false`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("back-end call `{call_site}` failed: {message}")]
pub struct BackendFault {
    /// Which bound capability was being invoked (e.g. "memlog.Logger.log_event")
    pub call_site: String,
    /// Panic payload or error text
    pub message: String,
}

impl BackendFault {
    pub fn new(call_site: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            call_site: call_site.into(),
            message: message.into(),
        }
    }
}

/// Errors produced by the logging facade
#[derive(Error, Debug)]
pub enum LogError {
    /// No supported back-end is loaded; the facade behaves as a no-op sink
    #[error("No supported logging back-end was found")]
    ProviderNotFound,

    /// A required capability could not be located on the detected back-end
    #[error("Error binding {provider} back-end: {reason}")]
    BindingFailure { provider: ProviderKind, reason: String },

    /// Raised by every log call once binding has failed
    #[error("Error initializing log provider")]
    ProviderInitialization {
        #[source]
        source: Arc<LogError>,
    },

    /// A back-end call failed (contained, reported out-of-band)
    #[error(transparent)]
    BackendFault(#[from] BackendFault),

    /// Facade configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl LogError {
    /// Create a binding failure error
    pub fn binding_failure(provider: ProviderKind, reason: impl Into<String>) -> Self {
        Self::BindingFailure {
            provider,
            reason: reason.into(),
        }
    }

    /// Wrap a cached initialization failure
    pub fn initialization(source: Arc<LogError>) -> Self {
        Self::ProviderInitialization { source }
    }

    /// The cached cause, if this is a provider initialization error
    pub fn cause(&self) -> Option<&Arc<LogError>> {
        match self {
            LogError::ProviderInitialization { source } => Some(source),
            _ => None,
        }
    }
}

pub type LogResult<T> = Result<T, LogError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_binding_failure_message() {
        let err = LogError::binding_failure(ProviderKind::MemLog, "memlog.LogLevel.Fatal not found");
        assert_eq!(
            err.to_string(),
            "Error binding memlog back-end: memlog.LogLevel.Fatal not found"
        );
    }

    #[test]
    fn test_initialization_carries_cause() {
        let cause = Arc::new(LogError::binding_failure(ProviderKind::Log, "missing"));
        let err = LogError::initialization(Arc::clone(&cause));

        assert!(Arc::ptr_eq(err.cause().unwrap(), &cause));
        assert!(err.source().unwrap().to_string().contains("missing"));
    }

    #[test]
    fn test_backend_fault_display() {
        let fault = BackendFault::new("memlog.Logger.info", "boom");
        let err: LogError = fault.clone().into();
        assert_eq!(err.to_string(), "back-end call `memlog.Logger.info` failed: boom");
    }
}
