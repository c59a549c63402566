//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or processing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The HTTP method is not supported.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// The request body could not be encoded.
    #[error("invalid body: {0}")]
    InvalidBody(String),

    /// A request path is empty or malformed.
    #[error("invalid path: {0}")]
    InvalidPath(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
