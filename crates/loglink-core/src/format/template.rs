//! Message template tokenizer

/// One hole in a message template, e.g. `{@order:j}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hole<'a> {
    /// The whole placeholder including braces
    pub raw: &'a str,
    /// Property name or positional index text
    pub name: &'a str,
    /// `@` (destructure) or `$` (stringify)
    pub operator: Option<char>,
    /// Format string after `:`
    pub format: Option<&'a str>,
}

impl Hole<'_> {
    /// Positional index for `{0}`-style holes
    pub fn position(&self) -> Option<usize> {
        if self.name.bytes().all(|b| b.is_ascii_digit()) {
            self.name.parse().ok()
        } else {
            None
        }
    }

    pub fn is_destructured(&self) -> bool {
        self.operator == Some('@')
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    Text(&'a str),
    /// `{{` or `}}`
    Escaped(char),
    Hole(Hole<'a>),
}

/// Split a template into text, escapes and holes
///
/// Anything that does not parse as a hole is kept as text.
pub fn tokenize(template: &str) -> Vec<Token<'_>> {
    let bytes = template.as_bytes();
    let mut tokens = Vec::new();
    let mut text_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' | b'}' if bytes.get(i + 1) == Some(&bytes[i]) => {
                push_text(&mut tokens, template, text_start, i);
                tokens.push(Token::Escaped(bytes[i] as char));
                i += 2;
                text_start = i;
            }
            b'{' => match parse_hole(template, i) {
                Some((hole, end)) => {
                    push_text(&mut tokens, template, text_start, i);
                    tokens.push(Token::Hole(hole));
                    i = end;
                    text_start = i;
                }
                None => i += 1,
            },
            _ => i += 1,
        }
    }
    push_text(&mut tokens, template, text_start, bytes.len());
    tokens
}

fn push_text<'a>(tokens: &mut Vec<Token<'a>>, template: &'a str, start: usize, end: usize) {
    if start < end {
        tokens.push(Token::Text(&template[start..end]));
    }
}

/// Parse a hole starting at the `{` at `start`; returns the hole and the index after `}`
fn parse_hole(template: &str, start: usize) -> Option<(Hole<'_>, usize)> {
    let rest = &template[start + 1..];
    let close = rest.find(['{', '}'])?;
    if rest.as_bytes()[close] != b'}' {
        return None;
    }

    let content = &rest[..close];
    let (operator, body) = match content.chars().next() {
        Some(op @ ('@' | '$')) => (Some(op), &content[1..]),
        _ => (None, content),
    };
    let (name, format) = match body.find(':') {
        Some(colon) => (&body[..colon], Some(&body[colon + 1..])),
        None => (body, None),
    };

    if name.is_empty() || name.contains(' ') || format.is_some_and(str::is_empty) {
        return None;
    }

    let end = start + 1 + close + 1;
    Some((
        Hole {
            raw: &template[start..end],
            name,
            operator,
            format,
        },
        end,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holes(template: &str) -> Vec<Hole<'_>> {
        tokenize(template)
            .into_iter()
            .filter_map(|t| match t {
                Token::Hole(h) => Some(h),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(tokenize("no holes here"), vec![Token::Text("no holes here")]);
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_named_and_positional() {
        let found = holes("Hello {name}, you are {0} today");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].name, "name");
        assert_eq!(found[0].position(), None);
        assert_eq!(found[1].position(), Some(0));
    }

    #[test]
    fn test_operators_and_format() {
        let found = holes("{@order} {$id} {amount:0.00}");
        assert!(found[0].is_destructured());
        assert_eq!(found[1].operator, Some('$'));
        assert_eq!(found[2].name, "amount");
        assert_eq!(found[2].format, Some("0.00"));
        assert_eq!(found[2].raw, "{amount:0.00}");
    }

    #[test]
    fn test_escapes() {
        assert_eq!(
            tokenize("{{literal}} {x}"),
            vec![
                Token::Escaped('{'),
                Token::Text("literal"),
                Token::Escaped('}'),
                Token::Text(" "),
                Token::Hole(Hole {
                    raw: "{x}",
                    name: "x",
                    operator: None,
                    format: None
                }),
            ]
        );
    }

    #[test]
    fn test_malformed_holes_stay_text() {
        assert!(holes("{ spaced }").is_empty());
        assert!(holes("{}").is_empty());
        assert!(holes("{unterminated").is_empty());
        assert!(holes("{a{b}").len() == 1);
        assert_eq!(holes("{a{b}")[0].name, "b");
    }
}
