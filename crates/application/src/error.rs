//! Application error types

use rolegate_domain::{AuthError, DomainError, StatusCode};
use thiserror::Error;

use crate::ports::{HttpClientError, SessionStorageError};

/// Errors surfaced to callers of the client.
///
/// Only `401` is acted upon inside the client; every other failure is
/// passed through with its detail intact.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Login was rejected or the session could not be refreshed.
    /// The session has been cleared.
    #[error("authentication failed: {0}")]
    Authentication(#[from] AuthError),

    /// The server refused the call for the current role (403).
    #[error("not authorized ({status}): {message}")]
    Authorization {
        /// Response status.
        status: StatusCode,
        /// Response body.
        message: String,
    },

    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(#[from] HttpClientError),

    /// The request was rejected again with a freshly refreshed token.
    /// The session has been cleared.
    #[error("request still unauthorized after refreshing the access token")]
    RetryExhausted,

    /// The server answered with a status the call does not expect.
    #[error("unexpected response {status}: {body}")]
    UnexpectedStatus {
        /// Response status.
        status: StatusCode,
        /// Response body.
        body: String,
    },

    /// The response body did not have the expected shape.
    #[error("invalid response body: {0}")]
    Decode(String),

    /// The request could not be built.
    #[error("invalid request: {0}")]
    Request(#[from] DomainError),

    /// Durable session storage failed.
    #[error("session storage error: {0}")]
    Storage(#[from] SessionStorageError),
}

impl ClientError {
    /// Returns true for errors that end the session and require a new login.
    #[must_use]
    pub const fn requires_login(&self) -> bool {
        matches!(self, Self::Authentication(_) | Self::RetryExhausted)
    }
}

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
