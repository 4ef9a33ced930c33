//! Token store.
//!
//! The [`TokenStore`] exclusively owns the current token record. Reads
//! are cheap and may happen from any number of concurrent callers;
//! writes go through `save`/`clear` only, under a single write lock, so
//! no reader ever observes a half-updated record. Every mutation is
//! written through to the injected persistence backend, both keys
//! together.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use quillpost_core::TokenRecord;
use tracing::{debug, warn};

use crate::error::PersistenceError;
use crate::persistence::{keys, MemoryPersistence, TokenPersistence};

/// Owns the current bearer token and its expiration instant.
pub struct TokenStore {
    record: RwLock<Option<TokenRecord>>,
    persistence: Arc<dyn TokenPersistence>,
}

impl TokenStore {
    /// Creates a store over the given persistence backend, loading any
    /// previously persisted record.
    ///
    /// An unreadable or unparseable persisted record is treated as
    /// absent rather than an error; the next `save` overwrites it.
    pub fn new(persistence: Arc<dyn TokenPersistence>) -> Self {
        let record = Self::load_persisted(persistence.as_ref());
        Self {
            record: RwLock::new(record),
            persistence,
        }
    }

    /// Creates a store over an in-memory backend; nothing survives the
    /// process. Intended for tests and ephemeral sessions.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryPersistence::new()))
    }

    fn load_persisted(persistence: &dyn TokenPersistence) -> Option<TokenRecord> {
        let value = match persistence.get(keys::TOKEN) {
            Ok(value) => value?,
            Err(e) => {
                warn!(error = %e, "Failed to read persisted token");
                return None;
            }
        };
        let raw_expiry = match persistence.get(keys::EXPIRES_AT) {
            Ok(value) => value?,
            Err(e) => {
                warn!(error = %e, "Failed to read persisted expiry");
                return None;
            }
        };

        match DateTime::parse_from_rfc3339(&raw_expiry) {
            Ok(expires_at) => {
                debug!("Loaded persisted token record");
                Some(TokenRecord::new(value, expires_at.with_timezone(&Utc)))
            }
            Err(e) => {
                warn!(error = %e, raw = %raw_expiry, "Unparseable persisted expiry, ignoring record");
                None
            }
        }
    }

    fn read(&self) -> Option<TokenRecord> {
        self.record
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Returns true iff a record exists, its value is non-empty, and
    /// its expiry is still inside the grace window.
    pub fn is_authenticated(&self) -> bool {
        self.read().is_some_and(|record| record.is_valid())
    }

    /// Returns the current token value, only while
    /// [`is_authenticated`](Self::is_authenticated) holds. Never
    /// returns an expired value and never panics.
    pub fn get_token(&self) -> Option<String> {
        self.read()
            .filter(TokenRecord::is_valid)
            .map(|record| record.value)
    }

    /// Returns the current record regardless of validity.
    ///
    /// The refresh coordinator uses this to inspect the nominal expiry
    /// without the grace window applied.
    pub fn current_record(&self) -> Option<TokenRecord> {
        self.read()
    }

    /// Atomically replaces the stored record and persists it.
    ///
    /// Both persisted keys are written together; on persistence failure
    /// the in-memory record is left unchanged.
    pub fn save(
        &self,
        value: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), PersistenceError> {
        let record = TokenRecord::new(value, expires_at);

        let mut guard = self
            .record
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        self.persistence.set(keys::TOKEN, &record.value)?;
        if let Err(e) = self
            .persistence
            .set(keys::EXPIRES_AT, &record.expires_at.to_rfc3339())
        {
            // Roll the token key back so durable storage never holds
            // the new value paired with the previous expiry.
            let rollback = match guard.as_ref() {
                Some(previous) => self.persistence.set(keys::TOKEN, &previous.value),
                None => self.persistence.remove(keys::TOKEN),
            };
            if let Err(rollback_err) = rollback {
                warn!(error = %rollback_err, "Token key rollback failed after partial save");
            }
            return Err(e);
        }

        *guard = Some(record);
        debug!(expires_at = %expires_at, "Token record saved");
        Ok(())
    }

    /// Removes the record from memory and persistence; subsequent
    /// [`is_authenticated`](Self::is_authenticated) is false.
    pub fn clear(&self) -> Result<(), PersistenceError> {
        let mut guard = self
            .record
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        self.persistence.remove(keys::TOKEN)?;
        self.persistence.remove(keys::EXPIRES_AT)?;

        *guard = None;
        debug!("Token record cleared");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quillpost_core::EXPIRY_GRACE_SECS;

    #[test]
    fn test_save_then_get_round_trip() {
        let store = TokenStore::in_memory();
        let expiry = Utc::now() + Duration::hours(1);

        store.save("abc", expiry).unwrap();

        assert!(store.is_authenticated());
        assert_eq!(store.get_token(), Some("abc".to_string()));
    }

    #[test]
    fn test_expired_token_is_not_returned() {
        let store = TokenStore::in_memory();
        let expiry = Utc::now() - Duration::seconds(EXPIRY_GRACE_SECS + 1);

        store.save("abc", expiry).unwrap();

        assert!(!store.is_authenticated());
        assert_eq!(store.get_token(), None);
        // The record itself is still present for the refresh path.
        assert!(store.current_record().is_some());
    }

    #[test]
    fn test_token_within_grace_window_is_returned() {
        let store = TokenStore::in_memory();
        let expiry = Utc::now() - Duration::seconds(EXPIRY_GRACE_SECS - 5);

        store.save("abc", expiry).unwrap();

        assert!(store.is_authenticated());
        assert_eq!(store.get_token(), Some("abc".to_string()));
    }

    #[test]
    fn test_clear_removes_record() {
        let store = TokenStore::in_memory();
        store.save("abc", Utc::now() + Duration::hours(1)).unwrap();

        store.clear().unwrap();

        assert!(!store.is_authenticated());
        assert_eq!(store.get_token(), None);
        assert!(store.current_record().is_none());
    }

    #[test]
    fn test_persisted_record_survives_reconstruction() {
        let persistence = Arc::new(MemoryPersistence::new());
        let expiry = Utc::now() + Duration::hours(1);

        {
            let store = TokenStore::new(persistence.clone());
            store.save("abc", expiry).unwrap();
        }

        let reloaded = TokenStore::new(persistence);
        assert!(reloaded.is_authenticated());
        assert_eq!(reloaded.get_token(), Some("abc".to_string()));
    }

    #[test]
    fn test_unparseable_persisted_expiry_is_ignored() {
        let persistence = Arc::new(MemoryPersistence::new());
        persistence.set(keys::TOKEN, "abc").unwrap();
        persistence.set(keys::EXPIRES_AT, "2025-01-01 00:00:00").unwrap();

        let store = TokenStore::new(persistence);
        assert!(!store.is_authenticated());
        assert!(store.current_record().is_none());
    }

    #[test]
    fn test_persisted_expiry_is_rfc3339() {
        let persistence = Arc::new(MemoryPersistence::new());
        let store = TokenStore::new(persistence.clone());

        store.save("abc", Utc::now() + Duration::hours(1)).unwrap();

        let raw = persistence.get(keys::EXPIRES_AT).unwrap().unwrap();
        assert!(DateTime::parse_from_rfc3339(&raw).is_ok());
    }

    /// Backend that fails every write to one key, for partial-write
    /// scenarios.
    struct FailingKeyPersistence {
        inner: Arc<MemoryPersistence>,
        fail_key: &'static str,
    }

    impl TokenPersistence for FailingKeyPersistence {
        fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
            if key == self.fail_key {
                return Err(PersistenceError::Unavailable("write rejected".to_string()));
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), PersistenceError> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn test_partial_persist_rolls_back_the_token_key() {
        let inner = Arc::new(MemoryPersistence::new());
        let old_expiry = Utc::now() + Duration::hours(1);
        inner.set(keys::TOKEN, "old-token").unwrap();
        inner.set(keys::EXPIRES_AT, &old_expiry.to_rfc3339()).unwrap();

        let store = TokenStore::new(Arc::new(FailingKeyPersistence {
            inner: inner.clone(),
            fail_key: keys::EXPIRES_AT,
        }));

        assert!(store.save("new-token", Utc::now() + Duration::hours(2)).is_err());

        // Durable storage still pairs the old token with the old expiry.
        assert_eq!(inner.get(keys::TOKEN).unwrap().as_deref(), Some("old-token"));
        let reloaded = TokenStore::new(inner);
        assert_eq!(reloaded.get_token(), Some("old-token".to_string()));
        // The in-memory record is untouched too.
        assert_eq!(store.get_token(), Some("old-token".to_string()));
    }

    #[test]
    fn test_partial_persist_on_an_empty_store_removes_the_token_key() {
        let inner = Arc::new(MemoryPersistence::new());
        let store = TokenStore::new(Arc::new(FailingKeyPersistence {
            inner: inner.clone(),
            fail_key: keys::EXPIRES_AT,
        }));

        assert!(store.save("new-token", Utc::now() + Duration::hours(1)).is_err());

        assert_eq!(inner.get(keys::TOKEN).unwrap(), None);
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_empty_value_is_not_authenticated() {
        let store = TokenStore::in_memory();
        store.save("", Utc::now() + Duration::hours(1)).unwrap();
        assert!(!store.is_authenticated());
    }
}
