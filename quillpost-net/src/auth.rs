//! Token source seam.
//!
//! The pipeline never owns credentials; it asks a [`TokenSource`] for a
//! bearer token when an endpoint requires auth. The canonical
//! implementation lives in `quillpost-auth` (`AuthSession`); tests
//! substitute scripted doubles.

use async_trait::async_trait;
use quillpost_core::RefreshError;

/// Supplies bearer tokens to the client pipeline.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Returns a usable bearer token, or `None` if no valid token is
    /// available and none can be obtained.
    ///
    /// Implementations backed by a renewable credential refresh it here
    /// before answering; the pipeline makes no network call when this
    /// returns `None`.
    async fn bearer_token(&self) -> Option<String>;

    /// Forces a renewal of the credential and returns the new token.
    ///
    /// Invoked by the pipeline at most once per call, after a 401/403
    /// on an authenticated request whose token came from this source.
    /// Credential kinds that cannot be renewed return
    /// [`RefreshError::NoRefreshCredential`].
    async fn refresh(&self) -> Result<String, RefreshError>;
}
