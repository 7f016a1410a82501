//! String diagnostic contexts for the `log` back-end
//!
//! `log` has no context support of its own; the bridge keeps a per-thread
//! stack and map and appends them to every message it emits.

use std::cell::RefCell;
use std::collections::BTreeMap;

#[derive(Default)]
struct ThreadContext {
    nested: Vec<String>,
    mapped: BTreeMap<String, String>,
}

thread_local! {
    static CONTEXT: RefCell<ThreadContext> = RefCell::new(ThreadContext::default());
}

pub(crate) fn push(text: &str) {
    let _ = CONTEXT.try_with(|ctx| ctx.borrow_mut().nested.push(text.to_string()));
}

pub(crate) fn pop() {
    let _ = CONTEXT.try_with(|ctx| ctx.borrow_mut().nested.pop());
}

pub(crate) fn set(key: &str, value: &str) {
    let _ = CONTEXT.try_with(|ctx| ctx.borrow_mut().mapped.insert(key.to_string(), value.to_string()));
}

pub(crate) fn remove(key: &str) {
    let _ = CONTEXT.try_with(|ctx| ctx.borrow_mut().mapped.remove(key));
}

pub(crate) fn get(key: &str) -> Option<String> {
    CONTEXT
        .try_with(|ctx| ctx.borrow().mapped.get(key).cloned())
        .ok()
        .flatten()
}

/// ` {k=v, ...} [outer > inner]`, or empty when both contexts are empty
pub(crate) fn suffix() -> String {
    CONTEXT
        .try_with(|ctx| {
            let ctx = ctx.borrow();
            let mut text = String::new();
            if !ctx.mapped.is_empty() {
                let pairs: Vec<String> = ctx.mapped.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                text.push_str(&format!(" {{{}}}", pairs.join(", ")));
            }
            if !ctx.nested.is_empty() {
                text.push_str(&format!(" [{}]", ctx.nested.join(" > ")));
            }
            text
        })
        .unwrap_or_default()
}

/// Pops the nested entry it was returned for
pub(crate) struct NestedPop;

impl Drop for NestedPop {
    fn drop(&mut self) {
        pop();
    }
}
