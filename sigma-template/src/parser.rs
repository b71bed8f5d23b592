//! Recursive-descent parser: turns the raw tag stream into a tree of
//! [`Node`]s, validating filter names against the registry as it goes.

use crate::error::{TemplateError, TemplateResult};
use crate::filters::FilterRegistry;
use crate::lexer::RawToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCall {
    pub name: String,
    pub arg: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    pub var: String,
    pub filters: Vec<FilterCall>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Output(Expr),
    If(String, Vec<Node>),
    For(String, String, Vec<Node>),
}

enum Frame {
    Root(Vec<Node>),
    If { var: String, body: Vec<Node> },
    For { loop_var: String, seq_var: String, body: Vec<Node> },
}

impl Frame {
    fn body_mut(&mut self) -> &mut Vec<Node> {
        match self {
            Frame::Root(body) => body,
            Frame::If { body, .. } => body,
            Frame::For { body, .. } => body,
        }
    }
}

fn parse_err(line: u32, col: u32, kind: impl Into<String>) -> TemplateError {
    TemplateError::ParseError { line, col, kind: kind.into() }
}

pub fn parse(tokens: Vec<RawToken>, registry: &FilterRegistry) -> TemplateResult<Vec<Node>> {
    let mut stack: Vec<Frame> = vec![Frame::Root(Vec::new())];

    for token in tokens {
        match token {
            RawToken::Literal(text) => {
                stack.last_mut().unwrap().body_mut().push(Node::Text(text));
            }
            RawToken::Output { content, line, col } => {
                let expr = parse_expr(&content, line, col, registry)?;
                stack.last_mut().unwrap().body_mut().push(Node::Output(expr));
            }
            RawToken::Stmt { content, line, col } => {
                let mut words = content.split_whitespace();
                match words.next() {
                    Some("if") => {
                        let var = words.next().ok_or_else(|| {
                            parse_err(line, col, "`if` requires a variable name")
                        })?;
                        if words.next().is_some() {
                            return Err(parse_err(line, col, "`if` takes exactly one variable"));
                        }
                        stack.push(Frame::If { var: var.to_string(), body: Vec::new() });
                    }
                    Some("endif") => {
                        let frame = stack.pop().ok_or_else(|| {
                            parse_err(line, col, "`endif` with no matching `if`")
                        })?;
                        let Frame::If { var, body } = frame else {
                            return Err(parse_err(line, col, "`endif` does not match an open `if`"));
                        };
                        stack.last_mut().unwrap().body_mut().push(Node::If(var, body));
                    }
                    Some("for") => {
                        let loop_var = words
                            .next()
                            .ok_or_else(|| parse_err(line, col, "`for` requires a loop variable"))?;
                        let in_kw = words
                            .next()
                            .ok_or_else(|| parse_err(line, col, "`for` requires `in`"))?;
                        if in_kw != "in" {
                            return Err(parse_err(line, col, "`for` requires `in` after the loop variable"));
                        }
                        let seq_var = words
                            .next()
                            .ok_or_else(|| parse_err(line, col, "`for` requires a sequence variable"))?;
                        if words.next().is_some() {
                            return Err(parse_err(line, col, "`for` has trailing tokens"));
                        }
                        stack.push(Frame::For {
                            loop_var: loop_var.to_string(),
                            seq_var: seq_var.to_string(),
                            body: Vec::new(),
                        });
                    }
                    Some("endfor") => {
                        let frame = stack.pop().ok_or_else(|| {
                            parse_err(line, col, "`endfor` with no matching `for`")
                        })?;
                        let Frame::For { loop_var, seq_var, body } = frame else {
                            return Err(parse_err(line, col, "`endfor` does not match an open `for`"));
                        };
                        stack
                            .last_mut()
                            .unwrap()
                            .body_mut()
                            .push(Node::For(loop_var, seq_var, body));
                    }
                    Some(other) => {
                        return Err(parse_err(line, col, format!("unknown tag `{other}`")));
                    }
                    None => {
                        return Err(parse_err(line, col, "empty `{% %}` tag"));
                    }
                }
            }
        }
    }

    if stack.len() != 1 {
        return Err(parse_err(0, 0, "unclosed `if`/`for` block at end of template"));
    }
    match stack.pop().unwrap() {
        Frame::Root(body) => Ok(body),
        _ => unreachable!("only the root frame should remain"),
    }
}

fn parse_expr(content: &str, line: u32, col: u32, registry: &FilterRegistry) -> TemplateResult<Expr> {
    let mut parts = content.split('|').map(str::trim);
    let var = parts
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| parse_err(line, col, "empty expression"))?
        .to_string();

    let mut filters = Vec::new();
    for part in parts {
        let (name, arg) = match part.split_once(':') {
            Some((name, raw_arg)) => {
                let raw_arg = raw_arg.trim();
                if !(raw_arg.starts_with('"') && raw_arg.ends_with('"') && raw_arg.len() >= 2) {
                    return Err(parse_err(line, col, format!("filter argument must be quoted: {raw_arg}")));
                }
                (name.trim(), Some(raw_arg[1..raw_arg.len() - 1].to_string()))
            }
            None => (part, None),
        };
        if name.is_empty() {
            return Err(parse_err(line, col, "empty filter name"));
        }
        if !registry.contains(name) {
            return Err(TemplateError::UnknownFilter(name.to_string()));
        }
        filters.push(FilterCall { name: name.to_string(), arg });
    }

    Ok(Expr { var, filters })
}
