//! Structured message formatting
//!
//! Back-ends that understand `{name}` templates natively receive the template
//! and the args untouched. For every other back-end the facade renders the
//! message itself, substituting named holes positionally in first-occurrence
//! order.

mod template;

pub use template::{tokenize, Hole, Token};

use crate::value::{render_value, LogValue};

/// Result of formatting a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedMessage {
    /// Rendered message, or the untouched template in native mode
    pub message: String,
    /// Named holes in first-occurrence order, without duplicates
    pub placeholders: Vec<String>,
}

/// Collect the named (non-positional) holes of a template
pub fn placeholder_names(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for token in tokenize(template) {
        if let Token::Hole(hole) = token {
            if hole.position().is_none() && !names.iter().any(|n| n == hole.name) {
                names.push(hole.name.to_string());
            }
        }
    }
    names
}

/// Render a template against positional args
///
/// With no args the template is returned untouched. Holes without a matching
/// arg stay literal and surplus args are ignored.
pub fn format_structured_message(template: &str, args: &[LogValue]) -> FormattedMessage {
    if args.is_empty() {
        return FormattedMessage {
            message: template.to_string(),
            placeholders: Vec::new(),
        };
    }

    let mut names: Vec<&str> = Vec::new();
    let mut message = String::with_capacity(template.len() + 16 * args.len());

    for token in tokenize(template) {
        match token {
            Token::Text(text) => message.push_str(text),
            Token::Escaped(c) => message.push(c),
            Token::Hole(hole) => {
                let index = hole.position().unwrap_or_else(|| {
                    names.iter().position(|n| *n == hole.name).unwrap_or_else(|| {
                        names.push(hole.name);
                        names.len() - 1
                    })
                });
                match args.get(index) {
                    Some(value) => message.push_str(&render_value(value, hole.is_destructured())),
                    None => message.push_str(hole.raw),
                }
            }
        }
    }

    FormattedMessage {
        message,
        placeholders: names.into_iter().map(str::to_string).collect(),
    }
}

/// Formatting policy fixed once per binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MessageFormatter {
    native_templates: bool,
}

impl MessageFormatter {
    pub fn new(native_templates: bool) -> Self {
        Self { native_templates }
    }

    /// Whether the back-end renders templates itself
    pub fn native_templates(&self) -> bool {
        self.native_templates
    }

    pub fn format(&self, template: &str, args: &[LogValue]) -> FormattedMessage {
        if self.native_templates {
            FormattedMessage {
                message: template.to_string(),
                placeholders: placeholder_names(template),
            }
        } else {
            format_structured_message(template, args)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_named() {
        let formatted = format_structured_message("Hello {name}", &[json!("World")]);
        assert_eq!(formatted.message, "Hello World");
        assert!(!formatted.message.contains("{name}"));
        assert_eq!(formatted.placeholders, vec!["name"]);
    }

    #[test]
    fn test_native_passthrough() {
        let formatter = MessageFormatter::new(true);
        let formatted = formatter.format("Hello {name}", &[json!("World")]);
        assert_eq!(formatted.message, "Hello {name}");
        assert_eq!(formatted.placeholders, vec!["name"]);
    }

    #[test]
    fn test_first_occurrence_order() {
        let formatted = format_structured_message(
            "{user} bought {item}; {user} paid {price}",
            &[json!("ann"), json!("tea"), json!(3.5)],
        );
        assert_eq!(formatted.message, "ann bought tea; ann paid 3.5");
        assert_eq!(formatted.placeholders, vec!["user", "item", "price"]);
    }

    #[test]
    fn test_more_holes_than_args() {
        let formatted = format_structured_message("{a} and {b} and {c}", &[json!(1)]);
        assert_eq!(formatted.message, "1 and {b} and {c}");
    }

    #[test]
    fn test_no_args_leaves_template() {
        let formatted = format_structured_message("Hello {name} {{x}}", &[]);
        assert_eq!(formatted.message, "Hello {name} {{x}}");
        assert!(formatted.placeholders.is_empty());
    }

    #[test]
    fn test_args_without_holes_ignored() {
        let formatted = format_structured_message("static text", &[json!(1), json!(2)]);
        assert_eq!(formatted.message, "static text");
    }

    #[test]
    fn test_positional_and_escapes() {
        let formatted = format_structured_message("{{{0}}} = {1}", &[json!("k"), json!(9)]);
        assert_eq!(formatted.message, "{k} = 9");
        assert!(formatted.placeholders.is_empty());
    }

    #[test]
    fn test_destructure_operator() {
        let formatted = format_structured_message("got {@order}", &[json!({"id": 1})]);
        assert_eq!(formatted.message, "got {\"id\":1}");

        let quoted = format_structured_message("{@name} vs {name}", &[json!("x")]);
        assert_eq!(quoted.message, "\"x\" vs x");
    }

    #[test]
    fn test_format_spec_is_not_applied() {
        let formatted = format_structured_message("total {amount:0.00}", &[json!(12)]);
        assert_eq!(formatted.message, "total 12");
    }
}
