use sigma_reasoner::ReasonerError;
use sigma_shapes::ShapeError;
use sigma_store::StoreError;
use sigma_template::TemplateError;
use thiserror::Error;

/// Aggregates every crate's error type behind one facade-level error so
/// callers only need to match on a single enum.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SigmaError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Reasoner(#[from] ReasonerError),

    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error(transparent)]
    Template(#[from] TemplateError),
}

pub type SigmaResult<T> = Result<T, SigmaError>;
