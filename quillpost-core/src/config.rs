//! Client pipeline configuration.
//!
//! A [`ClientConfig`] is constructed once at pipeline creation and is
//! immutable thereafter; there is no runtime mutation path.

use std::time::Duration;

use url::Url;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default total transport attempts per request.
const DEFAULT_MAX_RETRY_ATTEMPTS: u32 = 3;

// ============================================================================
// Client Config
// ============================================================================

/// Process-wide configuration for the client pipeline.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL used when an endpoint carries no override.
    pub base_url: Url,
    /// Headers applied to every request; endpoint headers win on
    /// key collision.
    pub default_headers: Vec<(String, String)>,
    /// Per-request transport timeout.
    pub timeout: Duration,
    /// Maximum total transport attempts per request, including the
    /// first. Only transport-level failures consume extra attempts;
    /// HTTP-status-level failures are never retried.
    pub max_retry_attempts: u32,
}

impl ClientConfig {
    /// Creates a configuration with default timeout and retry bounds.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            default_headers: Vec::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retry_attempts: DEFAULT_MAX_RETRY_ATTEMPTS,
        }
    }

    /// Creates a builder for this configuration.
    pub fn builder(base_url: Url) -> ClientConfigBuilder {
        ClientConfigBuilder::new(base_url)
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Creates a new builder with default settings.
    pub fn new(base_url: Url) -> Self {
        Self {
            config: ClientConfig::new(base_url),
        }
    }

    /// Adds a default header applied to every request.
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config
            .default_headers
            .push((name.into(), value.into()));
        self
    }

    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Sets the total transport attempt bound.
    pub fn max_retry_attempts(mut self, attempts: u32) -> Self {
        self.config.max_retry_attempts = attempts;
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://api.quillpost.dev").unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new(base());
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retry_attempts, 3);
        assert!(config.default_headers.is_empty());
    }

    #[test]
    fn test_builder() {
        let config = ClientConfig::builder(base())
            .default_header("Accept", "application/json")
            .timeout(Duration::from_secs(5))
            .max_retry_attempts(1)
            .build();

        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.max_retry_attempts, 1);
        assert_eq!(
            config.default_headers,
            vec![("Accept".to_string(), "application/json".to_string())]
        );
    }
}
