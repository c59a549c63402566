//! Rolegate Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer, plus configuration loading.

pub mod adapters;
pub mod auth;
pub mod config;
pub mod persistence;
pub mod serialization;

pub use adapters::{DEFAULT_REQUEST_TIMEOUT, ReqwestHttpClient};
pub use auth::{ClientCredentials, OAuth2TokenEndpoint};
pub use config::{ClientConfig, ConfigError, ENV_PREFIX};
pub use persistence::{FileSessionRepository, InMemorySessionStorage};
pub use serialization::{SerializationError, from_json_bytes, to_json_stable, to_json_stable_bytes};
