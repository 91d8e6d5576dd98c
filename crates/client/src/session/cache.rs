//! Persistence of the session between runs.
//!
//! A browser keeps the session in local storage; a command-line client keeps
//! it in a JSON file. Either way the cached entry is only a hint: the
//! authoritative check is always a `GET /auth/info` on bootstrap.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::User;

/// Errors reading or writing the session cache.
#[derive(Debug, Error)]
pub enum SessionCacheError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Corrupt session cache: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// What survives between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedSession {
    pub authenticated: bool,
    pub user: Option<User>,
    /// Raw `access_token` cookie value, replayed on the next run.
    #[serde(default)]
    pub access_token: Option<String>,
    pub saved_at: DateTime<Utc>,
}

/// Storage backend for [`CachedSession`].
pub trait SessionCache: Send + Sync {
    /// Load the cached session, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache exists but cannot be read.
    fn load(&self) -> Result<Option<CachedSession>, SessionCacheError>;

    /// Replace the cached session.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache cannot be written.
    fn save(&self, session: &CachedSession) -> Result<(), SessionCacheError>;

    /// Forget the cached session. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing cache cannot be removed.
    fn clear(&self) -> Result<(), SessionCacheError>;
}

/// JSON file cache.
#[derive(Debug, Clone)]
pub struct FileSessionCache {
    path: PathBuf,
}

impl FileSessionCache {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> SessionCacheError {
        SessionCacheError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SessionCache for FileSessionCache {
    fn load(&self) -> Result<Option<CachedSession>, SessionCacheError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };
        if contents.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn save(&self, session: &CachedSession) -> Result<(), SessionCacheError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let json = serde_json::to_string_pretty(session)?;
        let mut file = open_private(&self.path).map_err(|e| self.io_error(e))?;
        file.write_all(json.as_bytes()).map_err(|e| self.io_error(e))
    }

    fn clear(&self) -> Result<(), SessionCacheError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

/// Open for writing, truncated. The file holds a bearer token, so on unix it
/// is readable by the owner only, including when it already existed.
#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

/// In-memory cache, for tests and embedders that manage persistence themselves.
#[derive(Debug, Default)]
pub struct MemorySessionCache {
    entry: RwLock<Option<CachedSession>>,
}

impl MemorySessionCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionCache for MemorySessionCache {
    fn load(&self) -> Result<Option<CachedSession>, SessionCacheError> {
        Ok(self.entry.read().clone())
    }

    fn save(&self, session: &CachedSession) -> Result<(), SessionCacheError> {
        *self.entry.write() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionCacheError> {
        *self.entry.write() = None;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bakery_core::{UserId, UserRole};

    use super::*;

    fn sample() -> CachedSession {
        CachedSession {
            authenticated: true,
            user: Some(User {
                id: UserId::new(1),
                username: "alice".to_string(),
                email: "alice@bakery.example".to_string(),
                first_name: "Alice".to_string(),
                last_name: "Baker".to_string(),
                user_role: UserRole::Client,
            }),
            access_token: Some("\"Bearer abc\"".to_string()),
            saved_at: Utc::now(),
        }
    }

    #[test]
    fn test_file_cache_roundtrip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileSessionCache::new(dir.path().join("nested/session.json"));

        assert_eq!(cache.load().unwrap(), None);
        let session = sample();
        cache.save(&session).unwrap();
        assert_eq!(cache.load().unwrap(), Some(session));

        cache.clear().unwrap();
        assert_eq!(cache.load().unwrap(), None);
        cache.clear().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_file_cache_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        FileSessionCache::new(&path).save(&sample()).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        let fresh = dir.path().join("fresh.json");
        FileSessionCache::new(&fresh).save(&sample()).unwrap();
        let mode = std::fs::metadata(&fresh).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_file_cache_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = FileSessionCache::new(&path).load().unwrap_err();
        assert!(matches!(err, SessionCacheError::Corrupt(_)));
    }

    #[test]
    fn test_memory_cache() {
        let cache = MemorySessionCache::new();
        cache.save(&sample()).unwrap();
        assert!(cache.load().unwrap().is_some());
        cache.clear().unwrap();
        assert!(cache.load().unwrap().is_none());
    }
}
