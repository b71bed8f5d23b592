use thiserror::Error;

/// Failures surfaced by the interner and triple store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("id {id} is out of range for capacity {capacity}")]
    OutOfRange { id: u32, capacity: usize },

    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("interner is full at capacity {capacity}")]
    CapacityExceeded { capacity: usize },

    #[error("allocation failed while growing {what}")]
    OutOfMemory { what: &'static str },
}

pub type StoreResult<T> = Result<T, StoreError>;
