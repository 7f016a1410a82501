//! Dynamic values passed as message args and context entries

pub use serde_json::Value as LogValue;

/// Render a value for inclusion in a plain-text message
///
/// Strings are written raw and null renders empty. With `destructure` the
/// value is written as JSON text, so strings keep their quotes.
pub fn render_value(value: &LogValue, destructure: bool) -> String {
    if destructure {
        return value.to_string();
    }
    match value {
        LogValue::Null => String::new(),
        LogValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
