//! Retry policy for transport-level failures.
//!
//! Only transport-level failures (connection errors, timeouts) are ever
//! retried, immediately and without backoff, bounded by the configured
//! attempt count. HTTP-status-level failures are returned to the caller
//! as typed errors and never retried here.

use crate::transport::TransportError;

/// Bounded immediate-retry policy.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum total attempts, including the first.
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// Creates a policy allowing up to `max_attempts` total attempts.
    ///
    /// A bound of zero is treated as one attempt; the request always
    /// goes out at least once.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Returns true if a failed attempt number `attempt` (1-based)
    /// should be retried.
    pub fn should_retry(&self, attempt: u32, error: &TransportError) -> bool {
        attempt < self.max_attempts && error.is_retryable()
    }
}
