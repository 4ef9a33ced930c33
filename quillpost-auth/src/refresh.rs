//! Token refresh coordination.
//!
//! Credential kinds that expire but can be renewed (e.g. third-party
//! image-host tokens) go through the [`RefreshCoordinator`]. Its one
//! correctness property: at most one refresh request is outstanding at
//! any instant; concurrent callers attach to the in-flight attempt
//! instead of issuing duplicates.
//!
//! The attempt runs on a spawned task behind a shared future, so a
//! caller being cancelled never aborts a refresh other callers are
//! waiting on.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use quillpost_core::RefreshError;
use tracing::{debug, warn};

use crate::store::TokenStore;

// ============================================================================
// Refresher Trait
// ============================================================================

/// Result of a successful renewal.
#[derive(Debug, Clone)]
pub struct RefreshedToken {
    /// The new bearer token value.
    pub value: String,
    /// Lifetime of the new token, in seconds from now.
    pub expires_in: i64,
}

/// Issues one renewal request against the credential's refresh
/// endpoint.
///
/// Implementations exchange a long-lived refresh credential plus client
/// identifier/secret for a new access token. They do not touch the
/// token store; the coordinator owns that.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Performs one refresh round trip.
    async fn refresh(&self) -> Result<RefreshedToken, RefreshError>;
}

// ============================================================================
// Refresh Coordinator
// ============================================================================

type SharedRefresh = Shared<BoxFuture<'static, Result<String, RefreshError>>>;

/// Serializes token renewal for one credential identity.
///
/// State machine: `Fresh -> (expired) -> RefreshInFlight -> {Fresh |
/// Stale}`. Callers arriving while in flight await the same attempt.
pub struct RefreshCoordinator {
    store: Arc<TokenStore>,
    refresher: Arc<dyn TokenRefresher>,
    inflight: Mutex<Option<SharedRefresh>>,
}

impl RefreshCoordinator {
    /// Creates a coordinator renewing tokens into the given store.
    pub fn new(store: Arc<TokenStore>, refresher: Arc<dyn TokenRefresher>) -> Self {
        Self {
            store,
            refresher,
            inflight: Mutex::new(None),
        }
    }

    /// Returns the store this coordinator renews into.
    pub fn store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    /// Ensures the stored token's nominal expiry is in the future,
    /// renewing it if needed.
    ///
    /// Idempotent fast path: a token that is not strictly expired
    /// returns immediately with no I/O. On failure the store is left
    /// untouched, so the stale token remains in place.
    pub async fn ensure_fresh(&self) -> Result<(), RefreshError> {
        if self.token_is_fresh() {
            return Ok(());
        }
        self.run(false).await
    }

    /// Renews the token even if its nominal expiry has not passed.
    ///
    /// Used after a server rejected a nominally fresh token (401/403).
    /// Callers still attach to any in-flight attempt; the
    /// one-outstanding-request property holds.
    pub async fn refresh_now(&self) -> Result<String, RefreshError> {
        self.run(true).await?;
        self.store
            .get_token()
            .ok_or_else(|| RefreshError::RefreshFailed("no token after refresh".to_string()))
    }

    /// Like [`ensure_fresh`](Self::ensure_fresh), but returns the
    /// usable token value.
    pub async fn fresh_token(&self) -> Result<String, RefreshError> {
        self.ensure_fresh().await?;
        self.store
            .get_token()
            .ok_or_else(|| RefreshError::RefreshFailed("no token after refresh".to_string()))
    }

    async fn run(&self, force: bool) -> Result<(), RefreshError> {
        let Some(shared) = self.join_or_start(force) else {
            // Renewed by another caller while we waited on the lock.
            return Ok(());
        };

        let result = shared.await;
        self.clear_finished();
        result.map(|_| ())
    }

    fn token_is_fresh(&self) -> bool {
        self.store
            .current_record()
            .is_some_and(|record| !record.value.is_empty() && !record.is_expired_strict())
    }

    /// Joins the in-flight attempt, or starts one. Returns `None` when
    /// the token turned fresh while waiting for the lock (unless
    /// `force` is set).
    fn join_or_start(&self, force: bool) -> Option<SharedRefresh> {
        let mut guard = self
            .inflight
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if let Some(existing) = guard.as_ref() {
            // Unfinished attempt: attach instead of starting another.
            if existing.peek().is_none() {
                debug!("Attaching to in-flight token refresh");
                return Some(existing.clone());
            }
        }

        if !force && self.token_is_fresh() {
            return None;
        }

        debug!("Starting token refresh");
        let store = Arc::clone(&self.store);
        let refresher = Arc::clone(&self.refresher);

        // Spawned so a cancelled caller cannot abort an attempt other
        // callers share.
        let handle = tokio::spawn(async move {
            let refreshed = refresher.refresh().await?;
            let expires_at = Utc::now() + Duration::seconds(refreshed.expires_in);
            store
                .save(&refreshed.value, expires_at)
                .map_err(|e| RefreshError::RefreshFailed(format!("persist failed: {e}")))?;
            debug!(expires_at = %expires_at, "Token refreshed");
            Ok(refreshed.value)
        });

        let shared: SharedRefresh = async move {
            handle.await.unwrap_or_else(|e| {
                warn!(error = %e, "Refresh task failed");
                Err(RefreshError::RefreshFailed(format!("refresh task: {e}")))
            })
        }
        .boxed()
        .shared();

        *guard = Some(shared.clone());
        Some(shared)
    }

    /// Drops the in-flight slot once the attempt has settled, so the
    /// next expiry starts a new attempt.
    fn clear_finished(&self) {
        let mut guard = self
            .inflight
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if guard.as_ref().is_some_and(|f| f.peek().is_some()) {
            *guard = None;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
