//! Client pipeline.
//!
//! [`ApiClient`] orchestrates one typed request/response exchange:
//! URL resolution, header merging, auth-token injection, body encoding,
//! transport invocation, status interpretation, and typed decoding.
//! It holds no credential state of its own; authenticated calls go
//! through the injected [`TokenSource`].

use std::sync::Arc;

use quillpost_core::{ApiError, BodyEncoding, ClientConfig, Method, RefreshError, RequestEnvelope};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::auth::TokenSource;
use crate::body::IntoMultipart;
use crate::retry::RetryPolicy;
use crate::transport::{
    HttpTransport, RequestBody, Transport, TransportError, TransportRequest, TransportResponse,
};

// ============================================================================
// Error Envelope
// ============================================================================

/// Best-effort server error envelope: `{"error": ...}` or `{"message": ...}`.
#[derive(Debug, serde::Deserialize)]
struct ServerErrorEnvelope {
    error: Option<String>,
    message: Option<String>,
}

fn decode_error_envelope(body: &[u8]) -> Option<String> {
    let envelope: ServerErrorEnvelope = serde_json::from_slice(body).ok()?;
    envelope
        .error
        .or(envelope.message)
        .filter(|m| !m.is_empty())
}

// ============================================================================
// API Client
// ============================================================================

/// The client pipeline binding endpoint descriptors to a shared
/// transport and token source.
#[derive(Clone)]
pub struct ApiClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    token_source: Option<Arc<dyn TokenSource>>,
    retry: RetryPolicy,
}

impl ApiClient {
    /// Creates a client over the reqwest transport, using the config's
    /// timeout.
    pub fn new(config: ClientConfig) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(config.timeout)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Creates a client over an injected transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let retry = RetryPolicy::new(config.max_retry_attempts);
        Self {
            config,
            transport,
            token_source: None,
            retry,
        }
    }

    /// Injects the token source consulted for authenticated endpoints.
    pub fn with_token_source(mut self, source: Arc<dyn TokenSource>) -> Self {
        self.token_source = Some(source);
        self
    }

    /// Returns the pipeline configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Sends a JSON-encoded request and decodes the typed response.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] without any transport call
    /// when the endpoint requires auth and no valid token is available.
    /// Status-level failures map per the taxonomy: 401/403 →
    /// `Unauthorized` (after at most one refresh-then-retry cycle),
    /// 404 → `NotFound`, other non-2xx → `Api` when the server sent an
    /// error envelope, `Server` otherwise.
    #[instrument(skip(self, envelope), fields(method = %envelope.endpoint.method(), path = %envelope.endpoint.path()))]
    pub async fn send<Req, Res>(&self, envelope: RequestEnvelope<Req, Res>) -> Result<Res, ApiError>
    where
        Req: Serialize + Send,
        Res: DeserializeOwned,
    {
        let body = match envelope.body {
            None => RequestBody::None,
            Some(ref body) => match envelope.endpoint.encoding() {
                BodyEncoding::Json => RequestBody::Json(
                    serde_json::to_vec(body)
                        .map_err(|e| ApiError::Decoding(format!("request body: {e}")))?,
                ),
                BodyEncoding::Multipart => {
                    return Err(ApiError::Decoding(
                        "multipart endpoint requires send_multipart".to_string(),
                    ));
                }
            },
        };

        self.dispatch(
            envelope.endpoint.method(),
            self.resolve_url(envelope.endpoint.base_url_override(), envelope.endpoint.path())?,
            envelope.endpoint.headers().to_vec(),
            envelope.endpoint.requires_auth(),
            envelope.explicit_token,
            body,
        )
        .await
    }

    /// Sends a `multipart/form-data` request and decodes the typed
    /// response. Used by binary payloads such as image uploads.
    #[instrument(skip(self, envelope), fields(method = %envelope.endpoint.method(), path = %envelope.endpoint.path()))]
    pub async fn send_multipart<Req, Res>(
        &self,
        envelope: RequestEnvelope<Req, Res>,
    ) -> Result<Res, ApiError>
    where
        Req: IntoMultipart + Send,
        Res: DeserializeOwned,
    {
        let body = match envelope.body {
            None => RequestBody::None,
            Some(body) => RequestBody::Multipart(body.into_fields()),
        };

        self.dispatch(
            envelope.endpoint.method(),
            self.resolve_url(envelope.endpoint.base_url_override(), envelope.endpoint.path())?,
            envelope.endpoint.headers().to_vec(),
            envelope.endpoint.requires_auth(),
            envelope.explicit_token,
            body,
        )
        .await
    }

    // ========================================================================
    // Pipeline internals
    // ========================================================================

    /// Resolves the effective URL: endpoint override, else the
    /// configured default base, joined with the endpoint path.
    fn resolve_url(&self, base_override: Option<&Url>, path: &str) -> Result<Url, ApiError> {
        let base = base_override.unwrap_or(&self.config.base_url);
        base.join(path)
            .map_err(|e| ApiError::InvalidUrl(format!("{base} + {path}: {e}")))
    }

    /// Merges headers in order: config defaults < endpoint headers <
    /// Authorization. Later entries win on (case-insensitive) key
    /// collision.
    fn merge_headers(
        &self,
        endpoint_headers: &[(String, String)],
        token: Option<&str>,
    ) -> Vec<(String, String)> {
        fn upsert(headers: &mut Vec<(String, String)>, name: &str, value: String) {
            match headers.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
                Some((_, existing)) => *existing = value,
                None => headers.push((name.to_string(), value)),
            }
        }

        let mut merged = Vec::new();
        for (name, value) in self.config.default_headers.iter().chain(endpoint_headers) {
            upsert(&mut merged, name, value.clone());
        }
        if let Some(token) = token {
            upsert(&mut merged, "Authorization", format!("Bearer {token}"));
        }
        merged
    }

    /// Runs the authenticated dispatch: token acquisition, transport
    /// with bounded retry, status interpretation, and at most one
    /// refresh-then-retry cycle on 401/403.
    async fn dispatch<Res: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        endpoint_headers: Vec<(String, String)>,
        requires_auth: bool,
        explicit_token: Option<String>,
        body: RequestBody,
    ) -> Result<Res, ApiError> {
        let token = if requires_auth {
            let token = match &explicit_token {
                Some(token) => Some(token.clone()),
                None => match &self.token_source {
                    Some(source) => source.bearer_token().await,
                    None => None,
                },
            };
            // No valid token obtainable: fail before any network call.
            let Some(token) = token else {
                debug!("No valid token available, skipping transport");
                return Err(ApiError::Unauthorized);
            };
            Some(token)
        } else {
            None
        };

        let request = TransportRequest {
            method,
            url,
            headers: self.merge_headers(&endpoint_headers, token.as_deref()),
            body,
        };

        let response = self.execute_with_retry(request.clone()).await?;

        match Self::interpret::<Res>(&response) {
            Err(ApiError::Unauthorized) if requires_auth && explicit_token.is_none() => {
                let Some(source) = &self.token_source else {
                    return Err(ApiError::Unauthorized);
                };
                match source.refresh().await {
                    Ok(new_token) => {
                        debug!("Token renewed after 401/403, retrying once");
                        let retried = TransportRequest {
                            headers: self
                                .merge_headers(&endpoint_headers, Some(new_token.as_str())),
                            ..request
                        };
                        let response = self.execute_with_retry(retried).await?;
                        Self::interpret::<Res>(&response)
                    }
                    Err(RefreshError::NoRefreshCredential) => Err(ApiError::Unauthorized),
                    Err(e) => {
                        warn!(error = %e, "Token renewal failed after 401/403");
                        Err(ApiError::Refresh(e))
                    }
                }
            }
            other => other,
        }
    }

    /// Invokes the transport, retrying transport-level failures
    /// immediately up to the configured bound.
    async fn execute_with_retry(
        &self,
        request: TransportRequest,
    ) -> Result<TransportResponse, ApiError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            debug!(url = %request.url, attempt, "Dispatching request");

            match self.transport.execute(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    if self.retry.should_retry(attempt, &e) {
                        warn!(error = %e, attempt, "Transport failure, retrying");
                        continue;
                    }
                    return Err(ApiError::transport(e.to_string()));
                }
            }
        }
    }

    /// Maps a raw response to the typed result per the error taxonomy.
    fn interpret<Res: DeserializeOwned>(response: &TransportResponse) -> Result<Res, ApiError> {
        match response.status {
            200..=299 => serde_json::from_slice(&response.body)
                .map_err(|e| ApiError::Decoding(e.to_string())),
            // A 1xx as the final status means the server never sent a
            // real response.
            100..=199 => Err(ApiError::InvalidResponse),
            401 | 403 => Err(ApiError::Unauthorized),
            404 => Err(ApiError::NotFound),
            status => match decode_error_envelope(&response.body) {
                Some(message) => Err(ApiError::Api { message, status }),
                None => Err(ApiError::from_status(status)),
            },
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
