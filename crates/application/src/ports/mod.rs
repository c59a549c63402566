//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the session core and external systems.
//! Each port is a trait implemented by adapters in the infrastructure layer.

mod http_client;
mod session_storage;
mod token_exchange;

pub use http_client::{HttpClient, HttpClientError};
pub use session_storage::{SessionStorage, SessionStorageError};
pub use token_exchange::TokenExchange;
