//! File-based session persistence.
//!
//! The session is stored in the platform-specific config directory:
//! - Linux: ~/.config/rolegate/session.json
//! - macOS: ~/Library/Application Support/rolegate/session.json
//! - Windows: %APPDATA%/rolegate/session.json

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rolegate_application::ports::{SessionStorage, SessionStorageError};
use rolegate_domain::Session;
use tokio::fs;
use tracing::debug;

use crate::serialization::{from_json_bytes, to_json_stable_bytes};

/// File name of the persisted session.
const SESSION_FILE: &str = "session.json";

/// Session storage backed by a single JSON file.
///
/// ```json
/// {
///   "access_token": "eyJhbGciOi...",
///   "refresh_token": "d2b1...",
///   "role": "admin"
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileSessionRepository {
    path: PathBuf,
}

impl FileSessionRepository {
    /// Stores the session at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Stores the session in the default location under the user's config directory.
    ///
    /// # Errors
    ///
    /// Returns `SessionStorageError::NoLocation` if there is no config directory.
    pub fn in_config_dir() -> Result<Self, SessionStorageError> {
        Self::default_path()
            .map(Self::new)
            .ok_or(SessionStorageError::NoLocation)
    }

    /// Returns the default session file path, if a config directory exists.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("rolegate").join(SESSION_FILE))
    }

    /// Path of the session file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

#[async_trait]
impl SessionStorage for FileSessionRepository {
    async fn load(&self) -> Result<Option<Session>, SessionStorageError> {
        let content = match fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let session = from_json_bytes(&content)
            .map_err(|e| SessionStorageError::Serialization(e.to_string()))?;
        Ok(Some(session))
    }

    async fn save(&self, session: &Session) -> Result<(), SessionStorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = to_json_stable_bytes(session)
            .map_err(|e| SessionStorageError::Serialization(e.to_string()))?;

        // Write then rename so a crash never leaves a half-written session.
        let temp = self.temp_path();
        fs::write(&temp, content).await?;
        fs::rename(&temp, &self.path).await?;

        debug!(path = %self.path.display(), "session persisted");
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionStorageError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "session file removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
