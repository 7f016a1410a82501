//! Scope guard returned by context opens

use std::marker::PhantomData;

/// Undoes one diagnostic context contribution
///
/// Released exactly once, either through [`ScopeGuard::release`] or on drop.
/// Contexts are thread-local, so a guard must be released on the thread that
/// opened it; the raw-pointer marker keeps it `!Send`.
#[must_use = "the context entry is removed as soon as the guard is dropped"]
pub struct ScopeGuard {
    release: Option<Box<dyn FnOnce()>>,
    _not_send: PhantomData<*const ()>,
}

impl ScopeGuard {
    /// A guard with nothing to undo
    pub fn noop() -> Self {
        Self {
            release: None,
            _not_send: PhantomData,
        }
    }

    pub(crate) fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
            _not_send: PhantomData,
        }
    }

    /// Whether releasing this guard does nothing
    pub fn is_noop(&self) -> bool {
        self.release.is_none()
    }

    /// Release now instead of at end of scope
    pub fn release(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        self.run();
    }
}

impl std::fmt::Debug for ScopeGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeGuard")
            .field("pending", &self.release.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_release_runs_once() {
        let count = Rc::new(Cell::new(0));
        let counter = Rc::clone(&count);
        let guard = ScopeGuard::new(move || counter.set(counter.get() + 1));

        assert!(!guard.is_noop());
        guard.release();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_drop_releases() {
        let count = Rc::new(Cell::new(0));
        {
            let counter = Rc::clone(&count);
            let _guard = ScopeGuard::new(move || counter.set(counter.get() + 1));
            assert_eq!(count.get(), 0);
        }
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_noop() {
        let guard = ScopeGuard::noop();
        assert!(guard.is_noop());
        guard.release();
    }
}
