//! Error taxonomy for the networking core.
//!
//! All failures surface to callers as [`ApiError`] variants; callers
//! decide whether to prompt re-authentication, show a message, or
//! abandon the operation. The core itself carries only the tag and raw
//! message, no presentation formatting.

use thiserror::Error;

// ============================================================================
// API Error
// ============================================================================

/// Error type produced by the client pipeline.
///
/// Never constructed by callers; the pipeline and auth layers are the
/// only producers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The base URL and path did not combine into a parseable URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The HTTP response was malformed.
    #[error("Invalid response from server")]
    InvalidResponse,

    /// A 2xx body did not decode into the endpoint's response schema.
    #[error("Failed to decode response: {0}")]
    Decoding(String),

    /// 5xx or transport-level failure.
    #[error("Server error: {message}")]
    Server {
        /// Raw message from the transport or a synthesized status line.
        message: String,
        /// HTTP status, when the failure came from a status code.
        status: Option<u16>,
    },

    /// Non-2xx with a structured message from the server.
    #[error("API error: {message}")]
    Api {
        /// Message decoded from the server's error envelope.
        message: String,
        /// HTTP status that carried the envelope.
        status: u16,
    },

    /// 401/403, or no valid token was available for an authenticated call.
    #[error("Unauthorized")]
    Unauthorized,

    /// 404.
    #[error("Not found")]
    NotFound,

    /// Token refresh failed while preparing an authenticated call.
    #[error("Refresh error: {0}")]
    Refresh(#[from] RefreshError),
}

impl ApiError {
    /// Builds a `Server` error from a bare status code.
    pub fn from_status(status: u16) -> Self {
        ApiError::Server {
            message: format!("status {status}"),
            status: Some(status),
        }
    }

    /// Builds a `Server` error from a transport-level failure message.
    pub fn transport(message: impl Into<String>) -> Self {
        ApiError::Server {
            message: message.into(),
            status: None,
        }
    }
}

// ============================================================================
// Refresh Error
// ============================================================================

/// Error type for token renewal attempts.
///
/// Cloneable so concurrent callers awaiting a shared in-flight refresh
/// all observe the same outcome.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RefreshError {
    /// The credential kind does not support renewal, or no refresh
    /// credential is configured.
    #[error("No refresh credential available")]
    NoRefreshCredential,

    /// The renewal attempt failed (non-2xx, decode failure, or
    /// transport error). The stored token is left untouched.
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),
}

// ============================================================================
// Tests
// ============================================================================
