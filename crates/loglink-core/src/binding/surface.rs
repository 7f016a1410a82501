//! Capability probe tables
//!
//! A `Surface` names where a back-end keeps each capability. Member names
//! follow one convention for every back-end (see [`members`]); only type
//! names and level aliases differ.

use crate::level::LogLevel;

/// Type names and level aliases of one back-end
#[derive(Debug)]
pub struct Surface {
    /// Module the types live in
    pub module: &'static str,
    /// Marker type; its presence means the back-end is loaded
    pub log_manager: &'static str,
    /// Type of logger instances
    pub logger: &'static str,
    /// Type holding level constants
    pub level: &'static str,
    /// Event type for the event-based dispatch shape
    pub log_event: Option<&'static str>,
    /// Configuration type exposing the native-template switch
    pub config_factory: Option<&'static str>,
    /// Nested context, object/logical shape
    pub nested_logical: Option<&'static str>,
    /// Nested context, string stack shape
    pub nested: Option<&'static str>,
    /// Mapped context, scoped shape
    pub mapped_logical: Option<&'static str>,
    /// Mapped context, set/remove shape
    pub mapped: Option<&'static str>,
    /// Candidate level constant names per facade level, tried in order
    pub level_aliases: [&'static [&'static str]; 6],
}

impl Surface {
    /// Level constant names to try for `level`
    pub fn level_candidates(&self, level: LogLevel) -> &'static [&'static str] {
        self.level_aliases[level.index()]
    }
}

/// Member naming convention shared by all back-ends
pub mod members {
    pub const GET_LOGGER: &str = "get_logger";
    pub const NAME: &str = "name";
    pub const NEW: &str = "new";
    pub const LOG_EVENT: &str = "log_event";
    pub const DEFAULT: &str = "default";
    pub const PARSE_MESSAGE_TEMPLATES: &str = "parse_message_templates";
    pub const PUSH_OBJECT: &str = "push_object";
    pub const PUSH: &str = "push";
    pub const SET_SCOPED: &str = "set_scoped";
    pub const SET: &str = "set";
    pub const REMOVE: &str = "remove";
    pub const GET: &str = "get";

    /// `is_<level>_enabled`
    pub fn is_enabled(level_name: &str) -> String {
        format!("is_{}_enabled", level_name.to_lowercase())
    }

    /// `<level>`
    pub fn log(level_name: &str) -> String {
        level_name.to_lowercase()
    }

    /// `<level>_exception`
    pub fn log_exception(level_name: &str) -> String {
        format!("{}_exception", level_name.to_lowercase())
    }
}
