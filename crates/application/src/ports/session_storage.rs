//! Session storage port
//!
//! Durable client-side storage for the session record.

use async_trait::async_trait;
use rolegate_domain::Session;

/// Errors that can occur during session storage operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionStorageError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// No location is available for the session file.
    #[error("could not determine a location for the session file")]
    NoLocation,
}

/// Repository trait for the persisted session.
///
/// The three session fields are always written and removed together.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Loads the persisted session.
    ///
    /// # Returns
    /// `None` when nothing is persisted.
    async fn load(&self) -> Result<Option<Session>, SessionStorageError>;

    /// Replaces the persisted session.
    ///
    /// # Errors
    /// Returns an error if the session cannot be written.
    async fn save(&self, session: &Session) -> Result<(), SessionStorageError>;

    /// Removes the persisted session. Removing an absent session succeeds.
    ///
    /// # Errors
    /// Returns an error if the stored session cannot be removed.
    async fn clear(&self) -> Result<(), SessionStorageError>;
}
