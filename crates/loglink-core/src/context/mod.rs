//! Diagnostic context scopes
//!
//! Two capabilities, each with two tolerated back-end shapes:
//!
//! | capability | logical / scoped shape          | legacy shape                     |
//! |------------|---------------------------------|----------------------------------|
//! | nested     | `push_object(value)` disposable | `push(text)` disposable          |
//! | mapped     | `set_scoped(key, value)`        | `set` / `remove` / `get` by key  |
//!
//! Logical and scoped shapes restore themselves when their disposable is
//! dropped. The legacy mapped shape has no restore of its own; the facade keeps
//! a per-thread frame stack per key (see [`frames`]) and puts the previous
//! value back on release.
//!
//! The legacy nested shape is a plain stack: releasing its guards out of push
//! order is undefined.

mod frames;
mod guard;

pub use guard::ScopeGuard;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::modules::{Disposable, GetStringFn, PushObjectFn, PushStringFn, RemoveFn, SetScopedFn, SetStringFn};
use crate::value::{render_value, LogValue};
use crate::wrapper::ExecutionWrapper;

/// Which back-end shape a context capability was bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextShape {
    /// Object values, restored by the back-end
    Logical,
    /// String values, set/remove or push/pop
    Legacy,
}

/// Nested (stack of values) context
#[derive(Clone)]
pub enum NestedContextCapability {
    Logical { push_object: PushObjectFn, site: Arc<str> },
    Legacy { push: PushStringFn, site: Arc<str> },
}

impl NestedContextCapability {
    pub fn shape(&self) -> ContextShape {
        match self {
            NestedContextCapability::Logical { .. } => ContextShape::Logical,
            NestedContextCapability::Legacy { .. } => ContextShape::Legacy,
        }
    }

    /// Push `value`; the guard pops it
    pub fn open(&self, wrapper: &ExecutionWrapper, value: LogValue) -> ScopeGuard {
        let (site, pushed) = match self {
            NestedContextCapability::Logical { push_object, site } => {
                (site, wrapper.invoke(site, || push_object(value)))
            }
            NestedContextCapability::Legacy { push, site } => {
                let text = render_value(&value, false);
                (site, wrapper.invoke(site, || push(&text)))
            }
        };
        match pushed {
            Ok(disposable) => dispose_on_release(wrapper, site, disposable),
            Err(_) => ScopeGuard::noop(),
        }
    }
}

impl std::fmt::Debug for NestedContextCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NestedContextCapability::Logical { site, .. } => f.debug_tuple("Logical").field(site).finish(),
            NestedContextCapability::Legacy { site, .. } => f.debug_tuple("Legacy").field(site).finish(),
        }
    }
}

/// Mapped (key/value) context
#[derive(Clone)]
pub enum MappedContextCapability {
    Scoped { set_scoped: SetScopedFn, site: Arc<str> },
    Legacy(LegacyMappedContext),
}

impl MappedContextCapability {
    pub fn shape(&self) -> ContextShape {
        match self {
            MappedContextCapability::Scoped { .. } => ContextShape::Logical,
            MappedContextCapability::Legacy(_) => ContextShape::Legacy,
        }
    }

    /// Set `key` to `value`; the guard restores whatever `key` held before
    ///
    /// The scoped shape stores the value as an object, so `destructure` only
    /// changes how the legacy shape renders it to text.
    pub fn open(&self, wrapper: &ExecutionWrapper, key: &str, value: LogValue, destructure: bool) -> ScopeGuard {
        match self {
            MappedContextCapability::Scoped { set_scoped, site } => {
                match wrapper.invoke(site, || set_scoped(key, value)) {
                    Ok(disposable) => dispose_on_release(wrapper, site, disposable),
                    Err(_) => ScopeGuard::noop(),
                }
            }
            MappedContextCapability::Legacy(legacy) => {
                legacy.open(wrapper, key, &render_value(&value, destructure))
            }
        }
    }
}

impl std::fmt::Debug for MappedContextCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MappedContextCapability::Scoped { site, .. } => f.debug_tuple("Scoped").field(site).finish(),
            MappedContextCapability::Legacy(legacy) => f.debug_tuple("Legacy").field(&legacy.type_name).finish(),
        }
    }
}

static NEXT_LEGACY_ID: AtomicUsize = AtomicUsize::new(1);

/// `set` / `remove` / `get` members of a legacy mapped context
#[derive(Clone)]
pub struct LegacyMappedContext {
    id: usize,
    type_name: Arc<str>,
    set: SetStringFn,
    remove: RemoveFn,
    get: GetStringFn,
}

impl LegacyMappedContext {
    pub fn new(type_name: impl Into<Arc<str>>, set: SetStringFn, remove: RemoveFn, get: GetStringFn) -> Self {
        Self {
            id: NEXT_LEGACY_ID.fetch_add(1, Ordering::Relaxed),
            type_name: type_name.into(),
            set,
            remove,
            get,
        }
    }

    fn site(&self, member: &str) -> String {
        format!("{}.{}", self.type_name, member)
    }

    fn open(&self, wrapper: &ExecutionWrapper, key: &str, text: &str) -> ScopeGuard {
        let snapshot = match wrapper.invoke(&self.site("get"), || (self.get)(key)) {
            Ok(snapshot) => snapshot,
            Err(_) => return ScopeGuard::noop(),
        };
        if wrapper.invoke(&self.site("set"), || (self.set)(key, text)).is_err() {
            return ScopeGuard::noop();
        }

        let frame = frames::push(self.id, key, snapshot);
        let context = self.clone();
        let wrapper = wrapper.clone();
        let key = key.to_string();
        ScopeGuard::new(move || context.release(&wrapper, &key, frame))
    }

    fn release(&self, wrapper: &ExecutionWrapper, key: &str, frame: u64) {
        match frames::pop(self.id, key, frame) {
            frames::Restore::Value(previous) => {
                let _ = wrapper.invoke(&self.site("set"), || (self.set)(key, &previous));
            }
            frames::Restore::Absent => {
                let _ = wrapper.invoke(&self.site("remove"), || (self.remove)(key));
            }
            frames::Restore::Deferred => {}
        }
    }
}

fn dispose_on_release(wrapper: &ExecutionWrapper, site: &Arc<str>, disposable: Disposable) -> ScopeGuard {
    let wrapper = wrapper.clone();
    let site = format!("{}.dispose", site);
    ScopeGuard::new(move || {
        let _ = wrapper.invoke(&site, move || drop(disposable));
    })
}
