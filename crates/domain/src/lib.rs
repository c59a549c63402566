//! Rolegate Domain - Core types
//!
//! This crate defines the domain model for the Rolegate API client:
//! credentials and the role claim they carry, the persisted session,
//! request/response specifications and the managed-user resource.
//! All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod error;
pub mod managed_user;
pub mod request;
pub mod response;

pub use auth::{
    AccessToken, AuthError, RefreshToken, Role, Session, TokenClaims, TokenGrant, decode_claims,
};
pub use error::{DomainError, DomainResult};
pub use managed_user::{MANAGED_USERS_PATH, ManagedUser, ManagedUserEnvelope, NewManagedUser};
pub use request::{
    AUTHORIZATION, Header, Headers, HttpMethod, RequestBody, RequestBodyKind, RequestSpec,
};
pub use response::{ResponseSpec, StatusCode};
