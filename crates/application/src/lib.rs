//! Rolegate Application - Session core, use cases and ports
//!
//! This crate defines the application layer with:
//! - Port traits for the HTTP transport, the token endpoint and session storage
//! - The token lifecycle core: token store, single-flight refresh
//!   coordinator, authenticated transport and session boundary
//! - Managed-user use cases and the `RolegateClient` facade

pub mod auth;
pub mod client;
pub mod error;
pub mod ports;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod test_support;

pub use auth::{
    AuthenticatedTransport, LogoutReason, RefreshCoordinator, RefreshState, SessionBoundary,
    SessionEvent, SessionState, TokenStore,
};
pub use client::{ClientSettings, DEFAULT_REFRESH_TIMEOUT, RolegateClient};
pub use error::{ClientError, ClientResult};
pub use ports::{
    HttpClient, HttpClientError, SessionStorage, SessionStorageError, TokenExchange,
};
pub use use_cases::ManagedUsers;
