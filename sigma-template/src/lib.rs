//! Hand-rolled template lexer, parser, and LRU-cached evaluator.

pub mod engine;
pub mod error;
pub mod eval;
pub mod filters;
pub mod lexer;
pub mod parser;
pub mod value;

pub use engine::TemplateEngine;
pub use error::{TemplateError, TemplateResult};
pub use filters::FilterRegistry;
pub use parser::{Expr, FilterCall, Node};
pub use value::{Context, Value};
