use thiserror::Error;

use crate::mapping::MappingError;

use super::Operation;

/// Errors returned by backing stores and the facades layered on them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{0} is not supported")]
    UnsupportedOperation(Operation),
    #[error(transparent)]
    Mapping(#[from] MappingError),
    #[error("Table not found: {0}")]
    TableNotFound(String),
    #[error("Table already exists: {0}")]
    TableAlreadyExists(String),
    #[error("No tenant context is set")]
    MissingContext,
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Backing store error: {0}")]
    Backend(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
