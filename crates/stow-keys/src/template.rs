//! Lexer for key templates.
//!
//! A template is literal text interleaved with `{...}` expressions:
//!
//! ```text
//! {k}            whole (scalar) key
//! {k:fmt}        whole key with a format specifier
//! {k.member}     composite member, by index or field name
//! {k.member:fmt} member with a format specifier
//! {{ / }}        literal braces
//! ```
//!
//! Every expression must name the same key parameter. Resolving members
//! against the key type happens in [`KeyMap::compile`](crate::KeyMap::compile).

use crate::error::{KeyMapError, KeyResult};

/// One lexed piece of a template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Part {
    Literal(String),
    Expr {
        member: Option<String>,
        format: Option<String>,
    },
}

/// Split a template into literal runs and expressions.
pub(crate) fn lex(template: &str) -> KeyResult<Vec<Part>> {
    let shape = |reason: String| KeyMapError::Shape {
        template: template.to_string(),
        reason,
    };

    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut param: Option<&str> = None;
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        literal.push_str(&rest[..pos]);
        let brace = &rest[pos..];

        if brace.starts_with("{{") {
            literal.push('{');
            rest = &brace[2..];
            continue;
        }
        if brace.starts_with("}}") {
            literal.push('}');
            rest = &brace[2..];
            continue;
        }
        if brace.starts_with('}') {
            return Err(shape(format!("unmatched '}}' at byte {}", template.len() - brace.len())));
        }

        let close = brace
            .find('}')
            .ok_or_else(|| shape("unterminated '{' expression".into()))?;
        let body = &brace[1..close];
        if body.contains('{') {
            return Err(shape(format!("nested '{{' in expression {body:?}")));
        }

        let (expr, format) = match body.split_once(':') {
            Some((_, "")) => return Err(shape(format!("empty format specifier in {body:?}"))),
            Some((expr, format)) => (expr.trim(), Some(format.to_string())),
            None => (body.trim(), None),
        };
        let (name, member) = match expr.split_once('.') {
            Some((name, member)) => (name, Some(member)),
            None => (expr, None),
        };

        if !is_identifier(name) {
            return Err(shape(format!("expression {body:?} must start with the key parameter")));
        }
        if let Some(member) = member {
            let valid = is_identifier(member) || member.bytes().all(|b| b.is_ascii_digit());
            if member.is_empty() || !valid {
                return Err(shape(format!("unsupported member access {member:?}")));
            }
        }
        match param {
            Some(p) if p != name => {
                return Err(shape(format!(
                    "expressions reference both {p:?} and {name:?}; use one key parameter"
                )));
            }
            _ => param = Some(name),
        }

        if !literal.is_empty() {
            parts.push(Part::Literal(std::mem::take(&mut literal)));
        }
        parts.push(Part::Expr {
            member: member.map(str::to_string),
            format,
        });
        rest = &brace[close + 1..];
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        parts.push(Part::Literal(literal));
    }
    Ok(parts)
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
