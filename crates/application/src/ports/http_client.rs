//! HTTP client port

use async_trait::async_trait;
use rolegate_domain::{RequestSpec, ResponseSpec};

/// Transport-level failures: no HTTP response was obtained.
#[derive(Debug, thiserror::Error)]
pub enum HttpClientError {
    /// The request URL could not be built.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The request did not complete in time.
    #[error("request timed out after {timeout_ms} ms")]
    Timeout {
        /// The timeout that elapsed.
        timeout_ms: u64,
    },

    /// The server refused the connection.
    #[error("connection refused by {host}:{port}")]
    ConnectionRefused {
        /// Target host.
        host: String,
        /// Target port.
        port: u16,
    },

    /// The connection could not be established or was lost.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Any other transport failure.
    #[error("{0}")]
    Other(String),
}

/// Port for executing HTTP requests.
///
/// Implementations return every HTTP response, whatever its status, as
/// `Ok`. Only failures to obtain a response are errors.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Executes an HTTP request and returns the response.
    ///
    /// # Errors
    ///
    /// Returns an error if no response was received (network failure,
    /// timeout, invalid URL).
    async fn execute(&self, request: &RequestSpec) -> Result<ResponseSpec, HttpClientError>;
}
