//! memlog's own thread-local diagnostic contexts

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use crate::value::LogValue;

#[derive(Default)]
struct ThreadContext {
    next_entry: u64,
    nested: Vec<(u64, LogValue)>,
    mapped: BTreeMap<String, LogValue>,
    // Open `set_scoped` frames per key: (entry, value before the frame)
    scoped: HashMap<String, Vec<(u64, Option<LogValue>)>>,
}

thread_local! {
    // Keyed by back-end instance so several test back-ends never share state
    static CONTEXTS: RefCell<HashMap<usize, ThreadContext>> = RefCell::new(HashMap::new());
}

fn with_context<R>(backend: usize, f: impl FnOnce(&mut ThreadContext) -> R) -> Option<R> {
    CONTEXTS
        .try_with(|contexts| f(contexts.borrow_mut().entry(backend).or_default()))
        .ok()
}

pub(super) fn push_nested(backend: usize, value: LogValue) -> u64 {
    with_context(backend, |ctx| {
        ctx.next_entry += 1;
        ctx.nested.push((ctx.next_entry, value));
        ctx.next_entry
    })
    .unwrap_or(0)
}

pub(super) fn pop_nested(backend: usize) {
    with_context(backend, |ctx| ctx.nested.pop());
}

pub(super) fn remove_nested(backend: usize, entry: u64) {
    with_context(backend, |ctx| ctx.nested.retain(|(id, _)| *id != entry));
}

pub(super) fn nested(backend: usize) -> Vec<LogValue> {
    with_context(backend, |ctx| ctx.nested.iter().map(|(_, v)| v.clone()).collect()).unwrap_or_default()
}

pub(super) fn set_mapped(backend: usize, key: &str, value: LogValue) -> Option<LogValue> {
    with_context(backend, |ctx| ctx.mapped.insert(key.to_string(), value)).flatten()
}

pub(super) fn remove_mapped(backend: usize, key: &str) {
    with_context(backend, |ctx| ctx.mapped.remove(key));
}

pub(super) fn get_mapped(backend: usize, key: &str) -> Option<LogValue> {
    with_context(backend, |ctx| ctx.mapped.get(key).cloned()).flatten()
}

/// Set `key` inside a scope and return the scope's entry id
pub(super) fn set_scoped(backend: usize, key: &str, value: LogValue) -> u64 {
    with_context(backend, |ctx| {
        ctx.next_entry += 1;
        let entry = ctx.next_entry;
        let previous = ctx.mapped.insert(key.to_string(), value);
        ctx.scoped.entry(key.to_string()).or_default().push((entry, previous));
        entry
    })
    .unwrap_or(0)
}

/// Close scope `entry` of `key`
///
/// Only the innermost open scope restores; closing an outer scope first hands
/// its saved value to the scope above it.
pub(super) fn end_scoped(backend: usize, key: &str, entry: u64) {
    with_context(backend, |ctx| {
        let Some(frames) = ctx.scoped.get_mut(key) else {
            return;
        };
        let Some(position) = frames.iter().position(|(id, _)| *id == entry) else {
            return;
        };
        let (_, previous) = frames.remove(position);
        if position < frames.len() {
            frames[position].1 = previous;
        } else {
            match previous {
                Some(value) => {
                    ctx.mapped.insert(key.to_string(), value);
                }
                None => {
                    ctx.mapped.remove(key);
                }
            }
        }
        if frames.is_empty() {
            ctx.scoped.remove(key);
        }
    });
}

pub(super) fn mapped(backend: usize) -> BTreeMap<String, LogValue> {
    with_context(backend, |ctx| ctx.mapped.clone()).unwrap_or_default()
}

/// Undoes a `NestedDiagnosticsContext.push`
pub(super) struct NestedPop {
    pub backend: usize,
}

impl Drop for NestedPop {
    fn drop(&mut self) {
        pop_nested(self.backend);
    }
}

/// Undoes a `NestedDiagnosticsLogicalContext.push_object`
pub(super) struct NestedRemove {
    pub backend: usize,
    pub entry: u64,
}

impl Drop for NestedRemove {
    fn drop(&mut self) {
        remove_nested(self.backend, self.entry);
    }
}

/// Undoes a `MappedDiagnosticsLogicalContext.set_scoped`
pub(super) struct MappedRestore {
    pub backend: usize,
    pub key: String,
    pub entry: u64,
}

impl Drop for MappedRestore {
    fn drop(&mut self) {
        end_scoped(self.backend, &self.key, self.entry);
    }
}
