//! Auth error types.

use thiserror::Error;

/// Error type for token persistence operations.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Access to the backing store was denied.
    #[error("Access denied to credential store")]
    AccessDenied,

    /// The backing store is unavailable on this platform.
    #[error("Credential store unavailable: {0}")]
    Unavailable(String),

    /// IO error from a file-backed store.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error from a file-backed store.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Platform keychain error.
    #[error("Keychain error: {0}")]
    Platform(String),
}

impl From<keyring::Error> for PersistenceError {
    fn from(err: keyring::Error) -> Self {
        match err {
            keyring::Error::NoStorageAccess(_) => PersistenceError::AccessDenied,
            keyring::Error::PlatformFailure(e) => PersistenceError::Platform(e.to_string()),
            other => PersistenceError::Platform(other.to_string()),
        }
    }
}
