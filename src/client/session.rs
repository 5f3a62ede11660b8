//! # Session Store
//!
//! The session token is the only state that outlives a single call. It is read
//! at the start of every outbound request, written on login and cleared on
//! logout or on an authentication failure.
//!
//! Two stores are provided:
//! - [`MemorySessionStore`]: process-local, used by tests and short-lived tools
//! - [`FileSessionStore`]: a JSON key-value file on disk, entry `auth_token`
//!
//! ## Races
//!
//! Writes are not ordered across calls. If a `login` and a `logout` are in
//! flight at the same time, whichever store write lands last wins. Callers that
//! need a stronger guarantee must serialise those operations themselves.

use log::warn;
use serde_json::{Map, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;
use thiserror::Error;

/// Key of the persisted token entry.
pub const AUTH_TOKEN_KEY: &str = "auth_token";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session store is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Durable storage for the session token.
pub trait SessionStore: Send + Sync {
    /// The current token. An empty stored value counts as no token.
    fn token(&self) -> Option<String>;

    /// Persists `token`, replacing any previous one.
    fn set_token(&self, token: &str) -> Result<(), SessionError>;

    /// Removes the token. Returns `true` if a token was actually removed, so
    /// repeated clears report the removal only once.
    fn clear(&self) -> Result<bool, SessionError>;

    fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }
}

/// In-memory [`SessionStore`].
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    token: Mutex<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        // The guarded value is a plain Option, so a poisoned lock is still usable.
        self.token.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SessionStore for MemorySessionStore {
    fn token(&self) -> Option<String> {
        self.slot().clone().filter(|t| !t.is_empty())
    }

    fn set_token(&self, token: &str) -> Result<(), SessionError> {
        *self.slot() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<bool, SessionError> {
        Ok(self.slot().take().is_some_and(|t| !t.is_empty()))
    }
}

/// [`SessionStore`] backed by a JSON object on disk.
///
/// Other entries in the same file are preserved. The file is read on every
/// [`token`](SessionStore::token) call, so a token written by another process
/// is picked up by the next request.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    // Serialises read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn load(&self) -> Result<Map<String, Value>, SessionError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(Map::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(source) => Err(SessionError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Replaces the file atomically. The file holds a bearer token, so it is
    /// readable by its owner only.
    fn save(&self, entries: &Map<String, Value>) -> Result<(), SessionError> {
        let io_err = |source: std::io::Error| SessionError::Io {
            path: self.path.clone(),
            source,
        };
        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                std::fs::create_dir_all(parent).map_err(io_err)?;
                parent
            }
            None => Path::new("."),
        };

        let content = serde_json::to_string_pretty(entries)?;
        let mut staged = NamedTempFile::new_in(dir).map_err(io_err)?;
        staged.write_all(content.as_bytes()).map_err(io_err)?;
        staged.as_file().sync_all().map_err(io_err)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            staged
                .as_file()
                .set_permissions(std::fs::Permissions::from_mode(0o600))
                .map_err(io_err)?;
        }
        staged.persist(&self.path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn token(&self) -> Option<String> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        match self.load() {
            Ok(entries) => entries
                .get(AUTH_TOKEN_KEY)
                .and_then(Value::as_str)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            Err(e) => {
                warn!("⚠️  Could not read session store: {}", e);
                None
            }
        }
    }

    fn set_token(&self, token: &str) -> Result<(), SessionError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.load()?;
        entries.insert(AUTH_TOKEN_KEY.to_string(), Value::String(token.to_string()));
        self.save(&entries)
    }

    fn clear(&self) -> Result<bool, SessionError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.load()?;
        let removed = entries.remove(AUTH_TOKEN_KEY);
        if removed.is_none() {
            return Ok(false);
        }
        self.save(&entries)?;
        Ok(removed
            .as_ref()
            .and_then(Value::as_str)
            .is_some_and(|t| !t.is_empty()))
    }
}
