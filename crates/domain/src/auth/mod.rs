//! Authentication domain types

mod claims;
mod types;

pub use claims::{TokenClaims, decode_claims};
pub use types::{AccessToken, AuthError, RefreshToken, Role, Session, TokenGrant};
