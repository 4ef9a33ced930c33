//! Auth session.
//!
//! An [`AuthSession`] wires a [`TokenStore`] and an optional
//! [`RefreshCoordinator`] into the pipeline's `TokenSource` seam. It is
//! an explicitly constructed, injectable value; there is no global
//! shared instance.

use std::sync::Arc;

use async_trait::async_trait;
use quillpost_core::RefreshError;
use quillpost_net::TokenSource;
use tracing::warn;

use crate::error::PersistenceError;
use crate::refresh::RefreshCoordinator;
use crate::store::TokenStore;

/// Supplies the pipeline with bearer tokens from a store, renewing
/// through a coordinator when the credential kind supports it.
pub struct AuthSession {
    store: Arc<TokenStore>,
    coordinator: Option<Arc<RefreshCoordinator>>,
}

impl AuthSession {
    /// Creates a session over a non-renewable credential. Tokens come
    /// from the store only; once expired, callers must re-authenticate.
    pub fn new(store: Arc<TokenStore>) -> Self {
        Self {
            store,
            coordinator: None,
        }
    }

    /// Creates a session over a renewable credential. The session's
    /// store is the coordinator's store.
    pub fn with_refresh(coordinator: Arc<RefreshCoordinator>) -> Self {
        Self {
            store: Arc::clone(coordinator.store()),
            coordinator: Some(coordinator),
        }
    }

    /// Returns the underlying token store.
    pub fn store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    /// Clears the stored credential.
    pub fn logout(&self) -> Result<(), PersistenceError> {
        self.store.clear()
    }
}

#[async_trait]
impl TokenSource for AuthSession {
    async fn bearer_token(&self) -> Option<String> {
        let Some(coordinator) = &self.coordinator else {
            return self.store.get_token();
        };

        // Renewal starts as soon as the nominal expiry passes (no I/O
        // before that); a failed attempt falls back to the stored token
        // while the grace window lasts.
        match coordinator.fresh_token().await {
            Ok(token) => Some(token),
            Err(e) => {
                warn!(error = %e, "Token renewal failed");
                self.store.get_token()
            }
        }
    }

    async fn refresh(&self) -> Result<String, RefreshError> {
        match &self.coordinator {
            Some(coordinator) => coordinator.refresh_now().await,
            None => Err(RefreshError::NoRefreshCredential),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
