//! Managed users use case.
//!
//! Lists and creates users through the authenticated transport. Access is
//! decided by the server; a `403` is reported, not anticipated.

use rolegate_domain::{MANAGED_USERS_PATH, ManagedUser, NewManagedUser, RequestSpec, ResponseSpec};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::auth::AuthenticatedTransport;
use crate::error::{ClientError, ClientResult};

/// Use case for the managed users resource.
#[derive(Debug, Clone)]
pub struct ManagedUsers {
    transport: AuthenticatedTransport,
}

impl ManagedUsers {
    /// Creates the use case over an authenticated transport.
    #[must_use]
    pub const fn new(transport: AuthenticatedTransport) -> Self {
        Self { transport }
    }

    /// Lists all managed users.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Authorization` when the current role may not
    /// list users, plus any error of [`AuthenticatedTransport::send`].
    pub async fn list(&self) -> ClientResult<Vec<ManagedUser>> {
        let response = self.transport.send(RequestSpec::get(MANAGED_USERS_PATH)).await?;
        let users: Vec<ManagedUser> = decode(&response)?;
        debug!(count = users.len(), "listed managed users");
        Ok(users)
    }

    /// Creates a managed user and returns the stored record.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Authorization` when the current role may not
    /// create users, `ClientError::UnexpectedStatus` when the server rejects
    /// the attributes, plus any error of [`AuthenticatedTransport::send`].
    pub async fn create(&self, user: &NewManagedUser) -> ClientResult<ManagedUser> {
        let request = RequestSpec::post_json(MANAGED_USERS_PATH, &user.envelope())?;
        let response = self.transport.send(request).await?;
        let created: ManagedUser = decode(&response)?;
        debug!(id = created.id, role = %created.role, "created managed user");
        Ok(created)
    }
}

fn decode<T: DeserializeOwned>(response: &ResponseSpec) -> ClientResult<T> {
    if response.status.is_forbidden() {
        return Err(ClientError::Authorization {
            status: response.status,
            message: response.body_text(),
        });
    }
    if !response.is_success() {
        return Err(ClientError::UnexpectedStatus {
            status: response.status,
            body: response.body_text(),
        });
    }
    response
        .json_body()
        .map_err(|e| ClientError::Decode(e.to_string()))
}
