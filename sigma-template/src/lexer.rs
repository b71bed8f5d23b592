//! One-pass lexer: splits template source into literal text and the raw
//! (untyped) contents of `{{ ... }}` / `{% ... %}` tags.

use crate::error::{TemplateError, TemplateResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawToken {
    Literal(String),
    Output { content: String, line: u32, col: u32 },
    Stmt { content: String, line: u32, col: u32 },
}

fn line_col(source: &str, byte_offset: usize) -> (u32, u32) {
    let mut line = 1u32;
    let mut col = 1u32;
    for ch in source[..byte_offset].chars() {
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

pub fn lex(source: &str) -> TemplateResult<Vec<RawToken>> {
    let mut tokens = Vec::new();
    let mut rest = source;
    let mut consumed = 0usize;

    loop {
        let next_output = rest.find("{{");
        let next_stmt = rest.find("{%");
        let next = match (next_output, next_stmt) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        };

        let Some(idx) = next else {
            if !rest.is_empty() {
                tokens.push(RawToken::Literal(rest.to_string()));
            }
            break;
        };

        if idx > 0 {
            tokens.push(RawToken::Literal(rest[..idx].to_string()));
        }

        let is_output = rest[idx..].starts_with("{{");
        let close = if is_output { "}}" } else { "%}" };
        let tag_offset = consumed + idx;
        let (line, col) = line_col(source, tag_offset);

        let after_open = &rest[idx + 2..];
        let Some(end_rel) = after_open.find(close) else {
            return Err(TemplateError::ParseError {
                line,
                col,
                kind: "unclosed tag".to_string(),
            });
        };

        let content = after_open[..end_rel].trim().to_string();
        if is_output {
            tokens.push(RawToken::Output { content, line, col });
        } else {
            tokens.push(RawToken::Stmt { content, line, col });
        }

        let total = idx + 2 + end_rel + close.len();
        consumed += total;
        rest = &rest[total..];
    }

    Ok(tokens)
}
