//! Per-thread frame stacks for the legacy mapped context
//!
//! One stack per `(context, key)`. Each frame holds the value the key had
//! before that frame was opened. Releasing the top frame restores its
//! snapshot. Releasing a frame further down only splices it out: the frame
//! above inherits its snapshot, so whichever of them is released last restores
//! the value from before both.

use std::cell::RefCell;
use std::collections::HashMap;

struct Frame {
    id: u64,
    snapshot: Option<String>,
}

#[derive(Default)]
struct Frames {
    next_id: u64,
    stacks: HashMap<(usize, String), Vec<Frame>>,
}

thread_local! {
    static FRAMES: RefCell<Frames> = RefCell::new(Frames::default());
}

/// What the caller must do to the back-end after popping a frame
#[derive(Debug, PartialEq, Eq)]
pub(super) enum Restore {
    /// Set the key back to this value
    Value(String),
    /// Remove the key
    Absent,
    /// A frame above is still open; leave the key alone
    Deferred,
}

/// Record a new frame for `key` and return its id
pub(super) fn push(context: usize, key: &str, snapshot: Option<String>) -> u64 {
    FRAMES.with(|frames| {
        let mut frames = frames.borrow_mut();
        frames.next_id += 1;
        let id = frames.next_id;
        frames
            .stacks
            .entry((context, key.to_string()))
            .or_default()
            .push(Frame { id, snapshot });
        id
    })
}

/// Remove frame `id` and report what to restore
pub(super) fn pop(context: usize, key: &str, id: u64) -> Restore {
    // During thread teardown the stacks may already be gone
    FRAMES
        .try_with(|frames| {
            let mut frames = frames.borrow_mut();
            let slot = (context, key.to_string());
            let Some(stack) = frames.stacks.get_mut(&slot) else {
                return Restore::Deferred;
            };
            let Some(position) = stack.iter().position(|f| f.id == id) else {
                return Restore::Deferred;
            };

            let frame = stack.remove(position);
            let restore = if position == stack.len() {
                match frame.snapshot {
                    Some(value) => Restore::Value(value),
                    None => Restore::Absent,
                }
            } else {
                stack[position].snapshot = frame.snapshot;
                Restore::Deferred
            };

            if stack.is_empty() {
                frames.stacks.remove(&slot);
            }
            restore
        })
        .unwrap_or(Restore::Deferred)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_frame_restores_snapshot() {
        let outer = push(900, "k", None);
        let inner = push(900, "k", Some("v1".to_string()));

        assert_eq!(pop(900, "k", inner), Restore::Value("v1".to_string()));
        assert_eq!(pop(900, "k", outer), Restore::Absent);
    }

    #[test]
    fn test_spliced_frame_hands_snapshot_up() {
        let outer = push(901, "k", Some("before".to_string()));
        let inner = push(901, "k", Some("v1".to_string()));

        assert_eq!(pop(901, "k", outer), Restore::Deferred);
        assert_eq!(pop(901, "k", inner), Restore::Value("before".to_string()));
    }

    #[test]
    fn test_unknown_frame_is_ignored() {
        assert_eq!(pop(902, "k", 12345), Restore::Deferred);
    }

    #[test]
    fn test_frames_are_thread_local() {
        let id = push(903, "k", None);
        let other = std::thread::spawn(move || pop(903, "k", id)).join().unwrap();
        assert_eq!(other, Restore::Deferred);
        assert_eq!(pop(903, "k", id), Restore::Absent);
    }
}
