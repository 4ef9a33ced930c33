//! Token persistence backends.
//!
//! The token record is persisted as two key-value entries, `token` and
//! `expiresAt`. All backends implement [`TokenPersistence`]; the store
//! is the only caller and always writes or removes both keys together.
//!
//! Secure storage (the system keychain) is the production backend; the
//! file backend exists for platforms without a usable keychain, and the
//! memory backend serves tests and ephemeral sessions.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

use keyring::Entry;
use tracing::{debug, warn};

use crate::error::PersistenceError;

/// Keys under which the token record is persisted.
pub mod keys {
    /// Bearer token value.
    pub const TOKEN: &str = "token";
    /// Expiration instant, RFC 3339.
    pub const EXPIRES_AT: &str = "expiresAt";
}

// ============================================================================
// Persistence Trait
// ============================================================================

/// Durable key-value storage for the token record.
pub trait TokenPersistence: Send + Sync {
    /// Reads one key. Missing and empty values both read as `None`.
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Writes one key.
    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError>;

    /// Removes one key. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), PersistenceError>;
}

// ============================================================================
// Keyring Persistence
// ============================================================================

/// Default keychain service name.
const DEFAULT_SERVICE: &str = "quillpost";

/// System-keychain-backed persistence.
///
/// Each key becomes a keychain entry under the configured service name:
/// - macOS: Keychain Services
/// - Windows: Credential Manager
/// - Linux: Secret Service (GNOME Keyring, KDE Wallet)
#[derive(Debug, Clone)]
pub struct KeyringPersistence {
    service: String,
}

impl KeyringPersistence {
    /// Creates a backend under the default `quillpost` service.
    pub fn new() -> Self {
        Self::with_service(DEFAULT_SERVICE)
    }

    /// Creates a backend under a custom service name.
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry, PersistenceError> {
        Entry::new(&self.service, key).map_err(PersistenceError::from)
    }
}

impl Default for KeyringPersistence {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenPersistence for KeyringPersistence {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        match self.entry(key)?.get_password() {
            Ok(value) if !value.is_empty() => Ok(Some(value)),
            Ok(_) | Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.entry(key)?.set_password(value)?;
        debug!(service = %self.service, key, "Credential stored in keychain");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// File Persistence
// ============================================================================

/// File-backed persistence storing the keys as a small JSON object.
///
/// Written with owner-only permissions (0o600) on unix.
#[derive(Debug, Clone)]
pub struct FilePersistence {
    path: PathBuf,
}

impl FilePersistence {
    /// Creates a backend at the default path,
    /// `~/.quillpost/token.json`.
    pub fn new() -> Option<Self> {
        Some(Self::at_path(Self::default_path()?))
    }

    /// Creates a backend at a custom path.
    pub fn at_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Returns the default token file path.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".quillpost").join("token.json"))
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, PersistenceError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), PersistenceError> {
        if map.is_empty() {
            if self.path.exists() {
                std::fs::remove_file(&self.path)?;
            }
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(map)?;

        // Owner read/write only: the file holds a bearer token.
        #[cfg(unix)]
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(&self.path)?;

        #[cfg(not(unix))]
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)?;

        file.write_all(content.as_bytes())?;
        debug!(path = %self.path.display(), "Token file written");
        Ok(())
    }
}

impl TokenPersistence for FilePersistence {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self
            .read_map()?
            .remove(key)
            .filter(|value| !value.is_empty()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let mut map = self.read_map()?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        let mut map = match self.read_map() {
            Ok(map) => map,
            Err(e) => {
                // A corrupt file should not make logout fail.
                warn!(error = %e, "Unreadable token file, removing it");
                if self.path.exists() {
                    std::fs::remove_file(&self.path)?;
                }
                return Ok(());
            }
        };
        map.remove(key);
        self.write_map(&map)
    }
}

// ============================================================================
// Memory Persistence
// ============================================================================

/// Process-local persistence for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    map: Mutex<BTreeMap<String, String>>,
}

impl MemoryPersistence {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenPersistence for MemoryPersistence {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self
            .map
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .filter(|value| !value.is_empty())
            .cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.map
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        self.map
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
