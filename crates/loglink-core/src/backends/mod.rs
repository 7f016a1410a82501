//! Back-ends shipped with the core crate
//!
//! Other back-ends live in their own crates (see `loglink-log`) and publish
//! themselves into the module table the same way.

pub mod memlog;
