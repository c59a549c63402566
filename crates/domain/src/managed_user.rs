//! Managed user resource

use serde::{Deserialize, Serialize};

use crate::auth::Role;

/// Path of the managed users collection.
pub const MANAGED_USERS_PATH: &str = "/api/managed_users";

/// A user record as listed by the resource API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedUser {
    /// Server-assigned identifier.
    pub id: i64,
    /// Login email.
    pub email: String,
    /// Assigned role.
    pub role: Role,
}

/// Attributes for creating a managed user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewManagedUser {
    /// Login email.
    pub email: String,
    /// Initial password.
    pub password: String,
    /// Assigned role.
    pub role: Role,
}

impl NewManagedUser {
    /// Creates the attributes for a new user.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>, role: Role) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            role,
        }
    }

    /// Wraps the attributes the way the API expects: `{"managed_user": {...}}`.
    #[must_use]
    pub const fn envelope(&self) -> ManagedUserEnvelope<'_> {
        ManagedUserEnvelope { managed_user: self }
    }
}

/// Request body wrapper for `POST /api/managed_users`.
#[derive(Debug, Serialize)]
pub struct ManagedUserEnvelope<'a> {
    /// The wrapped attributes.
    pub managed_user: &'a NewManagedUser,
}
