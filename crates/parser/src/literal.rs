//! String literal decoding for docstrings and constant annotations.

use tree_sitter::Node;

/// Decoded value of a `string` or `concatenated_string` node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringLiteral {
    pub value: String,
    pub is_bytes: bool,
    /// f-strings are formatted at runtime and have no constant value
    pub is_formatted: bool,
}

impl StringLiteral {
    /// Plain `str` constant (neither bytes nor f-string)
    pub fn is_text(&self) -> bool {
        !self.is_bytes && !self.is_formatted
    }
}

/// Decode a string literal node; `None` for any other node kind
pub fn string_literal(node: Node, source: &str) -> Option<StringLiteral> {
    match node.kind() {
        "string" => Some(decode_piece(node.utf8_text(source.as_bytes()).ok()?)),
        "concatenated_string" => {
            let mut combined = StringLiteral {
                value: String::new(),
                is_bytes: false,
                is_formatted: false,
            };
            let mut cursor = node.walk();
            for part in node.named_children(&mut cursor) {
                if part.kind() != "string" {
                    continue;
                }
                let piece = decode_piece(part.utf8_text(source.as_bytes()).ok()?);
                combined.value.push_str(&piece.value);
                combined.is_bytes |= piece.is_bytes;
                combined.is_formatted |= piece.is_formatted;
            }
            Some(combined)
        }
        _ => None,
    }
}

fn decode_piece(text: &str) -> StringLiteral {
    let prefix_len = text
        .find(|c: char| c == '"' || c == '\'')
        .unwrap_or(text.len());
    let prefix = text[..prefix_len].to_ascii_lowercase();
    let rest = &text[prefix_len..];

    let quote = if rest.starts_with("\"\"\"") || rest.starts_with("'''") {
        3
    } else {
        1
    };
    let body = if rest.len() >= quote * 2 {
        &rest[quote..rest.len() - quote]
    } else {
        ""
    };

    let value = if prefix.contains('r') {
        body.to_string()
    } else {
        unescape(body)
    };

    StringLiteral {
        value,
        is_bytes: prefix.contains('b'),
        is_formatted: prefix.contains('f'),
    }
}

/// Resolve backslash escapes the way the Python tokenizer does; unknown
/// escapes keep their backslash.
fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(next) = chars.next() else {
            out.push('\\');
            break;
        };
        match next {
            '\n' => {}
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0c}'),
            'v' => out.push('\u{0b}'),
            'x' | 'u' | 'U' => {
                let width = match next {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let digits: String = chars.clone().take(width).collect();
                match (digits.len() == width)
                    .then(|| u32::from_str_radix(&digits, 16).ok())
                    .flatten()
                    .and_then(char::from_u32)
                {
                    Some(decoded) => {
                        out.push(decoded);
                        for _ in 0..width {
                            chars.next();
                        }
                    }
                    None => {
                        out.push('\\');
                        out.push(next);
                    }
                }
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }

    out
}

/// Docstring of a module or block: its first statement, when that is a
/// plain string expression, cleaned. Empty docstrings count as absent.
pub fn docstring(body: Node, source: &str) -> Option<String> {
    let mut cursor = body.walk();
    let first = body
        .named_children(&mut cursor)
        .find(|child| child.kind() != "comment")?;
    if first.kind() != "expression_statement" || first.named_child_count() != 1 {
        return None;
    }
    let literal = string_literal(first.named_child(0)?, source)?;
    if !literal.is_text() {
        return None;
    }
    let cleaned = clean_docstring(&literal.value);
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Normalize docstring indentation the way `inspect.cleandoc` does: the first
/// line is left-trimmed, the common indentation of the remaining lines is
/// removed, and leading/trailing blank lines are dropped.
pub fn clean_docstring(doc: &str) -> String {
    let expanded = expand_tabs(doc);
    let mut lines: Vec<&str> = expanded.split('\n').collect();

    let margin = lines
        .iter()
        .skip(1)
        .filter(|line| !line.trim_start().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min();

    let mut cleaned: Vec<String> = Vec::with_capacity(lines.len());
    if let Some(first) = lines.first() {
        cleaned.push(first.trim_start().to_string());
    }
    for line in lines.drain(..).skip(1) {
        let stripped = match margin {
            Some(margin) => line.get(margin..).unwrap_or_else(|| line.trim_start()),
            None => line,
        };
        cleaned.push(stripped.to_string());
    }

    while cleaned.last().is_some_and(|line| line.is_empty()) {
        cleaned.pop();
    }
    let leading = cleaned.iter().take_while(|line| line.is_empty()).count();
    cleaned.drain(..leading);

    cleaned.join("\n")
}

fn expand_tabs(text: &str) -> String {
    const TAB: usize = 8;
    let mut out = String::with_capacity(text.len());
    let mut column = 0;
    for c in text.chars() {
        match c {
            '\t' => {
                let pad = TAB - column % TAB;
                out.extend(std::iter::repeat(' ').take(pad));
                column += pad;
            }
            '\n' | '\r' => {
                out.push(c);
                column = 0;
            }
            _ => {
                out.push(c);
                column += 1;
            }
        }
    }
    out
}
