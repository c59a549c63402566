//! In-memory session storage.

use async_trait::async_trait;
use parking_lot::Mutex;
use rolegate_application::ports::{SessionStorage, SessionStorageError};
use rolegate_domain::Session;

/// Session storage that lives only as long as the process.
///
/// Useful for short-lived tools and tests where nothing should touch disk.
#[derive(Debug, Default)]
pub struct InMemorySessionStorage {
    session: Mutex<Option<Session>>,
}

impl InMemorySessionStorage {
    /// Creates an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStorage for InMemorySessionStorage {
    async fn load(&self) -> Result<Option<Session>, SessionStorageError> {
        Ok(self.session.lock().clone())
    }

    async fn save(&self, session: &Session) -> Result<(), SessionStorageError> {
        *self.session.lock() = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionStorageError> {
        self.session.lock().take();
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rolegate_domain::{AccessToken, RefreshToken, Role};

    #[tokio::test]
    async fn save_load_clear() {
        let storage = InMemorySessionStorage::new();
        let session = Session::new(AccessToken::new("A1"), RefreshToken::new("R1"), Role::admin());

        storage.save(&session).await.unwrap();
        assert_eq!(storage.load().await.unwrap(), Some(session));

        storage.clear().await.unwrap();
        assert_eq!(storage.load().await.unwrap(), None);
    }
}
