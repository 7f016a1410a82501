//! Execution wrapper around calls into back-end code
//!
//! A back-end that panics must not take the application down with it. Every
//! bound call goes through [`ExecutionWrapper::invoke`]; a panic becomes a
//! [`BackendFault`], is reported once on the diagnostics side channel, and the
//! log call reports failure instead of unwinding into the caller.
//!
//! Repeated identical faults from the same call site form one episode: only
//! the first is reported, the rest are counted, and a single summary is
//! written when the episode ends (a different fault, or the call site
//! succeeding again).
//!
//! Containment does not silence the process panic hook: unless the
//! application installs its own hook, each contained panic is still printed
//! to stderr by the default one.

use std::any::Any;
use std::error::Error;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::diagnostics::SharedSink;
use crate::error::BackendFault;

/// Guards calls into back-end code
#[derive(Clone)]
pub struct ExecutionWrapper {
    reporter: Arc<FaultReporter>,
}

impl ExecutionWrapper {
    pub fn new(sink: SharedSink) -> Self {
        Self {
            reporter: Arc::new(FaultReporter {
                sink,
                faulted: AtomicBool::new(false),
                episode: Mutex::new(None),
            }),
        }
    }

    /// Run `f`, converting a panic into a reported `BackendFault`
    pub fn invoke<R>(&self, call_site: &str, f: impl FnOnce() -> R) -> Result<R, BackendFault> {
        match catch_unwind(AssertUnwindSafe(f)) {
            Ok(value) => {
                self.reporter.succeeded(call_site);
                Ok(value)
            }
            Err(payload) => {
                let fault = BackendFault::new(call_site, panic_message(payload.as_ref()));
                self.reporter.report(&fault);
                Err(fault)
            }
        }
    }

    /// Whether a fault episode is currently open
    pub fn is_faulted(&self) -> bool {
        self.reporter.faulted.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for ExecutionWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionWrapper")
            .field("faulted", &self.is_faulted())
            .finish()
    }
}

struct Episode {
    fault: BackendFault,
    suppressed: u64,
}

struct FaultReporter {
    sink: SharedSink,
    // Lets the success path skip the lock while nothing is faulted
    faulted: AtomicBool,
    episode: Mutex<Option<Episode>>,
}

impl FaultReporter {
    fn report(&self, fault: &BackendFault) {
        let mut episode = self.episode.lock();
        if let Some(current) = episode.as_mut() {
            if current.fault == *fault {
                current.suppressed += 1;
                return;
            }
        }
        if let Some(previous) = episode.take() {
            self.summarize(&previous);
        }

        self.sink.error(&fault.to_string());
        *episode = Some(Episode {
            fault: fault.clone(),
            suppressed: 0,
        });
        self.faulted.store(true, Ordering::Release);
    }

    fn succeeded(&self, call_site: &str) {
        if !self.faulted.load(Ordering::Acquire) {
            return;
        }

        let mut episode = self.episode.lock();
        let ends_here = episode
            .as_ref()
            .is_some_and(|current| current.fault.call_site == call_site);
        if ends_here {
            if let Some(previous) = episode.take() {
                self.summarize(&previous);
            }
            self.faulted.store(false, Ordering::Release);
        }
    }

    fn summarize(&self, episode: &Episode) {
        if episode.suppressed > 0 {
            self.sink.warn(&format!(
                "back-end call `{}` failed {} more time(s) with the same error: {}",
                episode.fault.call_site, episode.suppressed, episode.fault.message
            ));
        }
    }
}

/// Extract the text of a panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Render an error and its source chain on one line
pub fn describe_error(error: &(dyn Error + 'static)) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(inner) = source {
        text.push_str(" ---> ");
        text.push_str(&inner.to_string());
        source = inner.source();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CaptureSink;
    use crate::level::LogLevel;

    fn wrapper() -> (ExecutionWrapper, Arc<CaptureSink>) {
        let sink = Arc::new(CaptureSink::new());
        (ExecutionWrapper::new(sink.clone()), sink)
    }

    #[test]
    fn test_success_passes_value_through() {
        let (wrapper, sink) = wrapper();
        assert_eq!(wrapper.invoke("site", || 7).unwrap(), 7);
        assert!(sink.entries().is_empty());
        assert!(!wrapper.is_faulted());
    }

    #[test]
    fn test_panic_is_contained() {
        let (wrapper, sink) = wrapper();
        let fault = wrapper
            .invoke("memlog.Logger.info", || -> () { panic!("target offline") })
            .unwrap_err();

        assert_eq!(fault.call_site, "memlog.Logger.info");
        assert_eq!(fault.message, "target offline");
        assert_eq!(sink.count(LogLevel::Error, "target offline"), 1);
        assert!(wrapper.is_faulted());
    }

    #[test]
    fn test_repeated_faults_reported_once() {
        let (wrapper, sink) = wrapper();
        for _ in 0..5 {
            let _ = wrapper.invoke("site", || -> () { panic!("same") });
        }
        assert_eq!(sink.count(LogLevel::Error, "same"), 1);
        assert_eq!(sink.entries().len(), 1);

        // Recovery closes the episode with one summary
        wrapper.invoke("site", || ()).unwrap();
        assert_eq!(sink.count(LogLevel::Warn, "4 more time(s)"), 1);
        assert!(!wrapper.is_faulted());

        // A new failure starts a new episode
        let _ = wrapper.invoke("site", || -> () { panic!("same") });
        assert_eq!(sink.count(LogLevel::Error, "same"), 2);
    }

    #[test]
    fn test_different_fault_starts_new_episode() {
        let (wrapper, sink) = wrapper();
        let _ = wrapper.invoke("a", || -> () { panic!("first") });
        let _ = wrapper.invoke("a", || -> () { panic!("first") });
        let _ = wrapper.invoke("b", || -> () { panic!("second") });

        assert_eq!(sink.count(LogLevel::Error, "first"), 1);
        assert_eq!(sink.count(LogLevel::Warn, "1 more time(s)"), 1);
        assert_eq!(sink.count(LogLevel::Error, "second"), 1);
    }

    #[test]
    fn test_success_elsewhere_keeps_episode_open() {
        let (wrapper, _sink) = wrapper();
        let _ = wrapper.invoke("a", || -> () { panic!("down") });
        wrapper.invoke("b", || ()).unwrap();
        assert!(wrapper.is_faulted());
    }

    #[test]
    fn test_panic_message_payloads() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let borrowed: Box<dyn Any + Send> = Box::new("static");
        let other: Box<dyn Any + Send> = Box::new(42u8);

        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(borrowed.as_ref()), "static");
        assert_eq!(panic_message(other.as_ref()), "unknown panic");
    }

    #[test]
    fn test_describe_error_chain() {
        #[derive(Debug, thiserror::Error)]
        #[error("disk full")]
        struct Inner;

        #[derive(Debug, thiserror::Error)]
        #[error("write failed")]
        struct Outer(#[source] Inner);

        assert_eq!(describe_error(&Outer(Inner)), "write failed ---> disk full");
    }
}
