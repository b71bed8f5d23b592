use sigma_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReasonerError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("materialization did not converge after {iterations} iterations")]
    DidNotConverge { iterations: u32 },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type ReasonerResult<T> = Result<T, ReasonerError>;
