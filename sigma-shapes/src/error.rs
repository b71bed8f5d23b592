use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("no shape registered with id {0:?}")]
    UnknownShape(crate::ShapeId),
}
