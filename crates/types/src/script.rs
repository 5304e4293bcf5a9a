//! Helpers for generated navigation scripts.
//!
//! The documentation generator emits its navigation data as JavaScript
//! assignments (`var NAVTREE = [...];`). Array bodies are valid JSON; string
//! constants may use single quotes.

use crate::payload::PayloadError;

/// Returns the expression assigned by `var <name> = <expr>;`, if present.
pub fn find_assignment<'a>(source: &'a str, name: &str) -> Option<&'a str> {
    let mut offset = 0;
    while let Some(pos) = source[offset..].find("var") {
        let start = offset + pos;
        offset = start + 3;
        if start > 0 && is_ident_byte(source.as_bytes()[start - 1]) {
            continue;
        }
        let rest = &source[offset..];
        let after_keyword = rest.trim_start();
        if after_keyword.len() == rest.len() {
            continue;
        }
        let Some(after_name) = after_keyword.strip_prefix(name) else {
            continue;
        };
        if after_name.bytes().next().is_some_and(is_ident_byte) {
            continue;
        }
        let Some(expr) = after_name.trim_start().strip_prefix('=') else {
            continue;
        };
        return Some(expression(expr).trim());
    }
    None
}

/// Strips a leading `var <name> =` and trailing `;` from a single-assignment
/// script. Text that is not an assignment is returned trimmed.
pub fn strip_assignment(source: &str) -> &str {
    let trimmed = source.trim();
    let Some(rest) = trimmed.strip_prefix("var") else {
        return trimmed;
    };
    if !rest.starts_with(char::is_whitespace) {
        return trimmed;
    }
    match rest.split_once('=') {
        Some((_, expr)) => expression(expr).trim(),
        None => trimmed,
    }
}

/// Decodes a single- or double-quoted string literal.
pub fn parse_string_literal(literal: &str) -> Result<String, PayloadError> {
    let literal = literal.trim();
    let quote = literal
        .chars()
        .next()
        .filter(|c| *c == '\'' || *c == '"')
        .ok_or_else(|| PayloadError::InvalidLiteral(literal.to_string()))?;
    let body = literal[1..]
        .strip_suffix(quote)
        .ok_or_else(|| PayloadError::InvalidLiteral(literal.to_string()))?;

    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => return Err(PayloadError::InvalidLiteral(literal.to_string())),
        }
    }
    Ok(out)
}

/// Slices `source` up to the first top-level `;`, skipping brackets and strings.
fn expression(source: &str) -> &str {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in source.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '[' | '{' | '(' => depth += 1,
            ']' | '}' | ')' => depth = depth.saturating_sub(1),
            ';' if depth == 0 => return &source[..i],
            _ => {}
        }
    }
    source
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}
