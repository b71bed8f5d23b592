use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("parse error at {line}:{col}: {kind}")]
    ParseError { line: u32, col: u32, kind: String },

    #[error("unknown filter {0:?}")]
    UnknownFilter(String),

    #[error("filter {filter:?} cannot be applied to a {actual} value")]
    FilterTypeMismatch { filter: String, actual: &'static str },
}

pub type TemplateResult<T> = Result<T, TemplateError>;
