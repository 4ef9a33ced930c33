//! HTTP transport.
//!
//! A [`Transport`] performs exactly one network round trip and returns
//! raw status + bytes; all interpretation happens in the pipeline. The
//! canonical implementation is [`HttpTransport`] over a shared reqwest
//! client.

use std::time::Duration;

use async_trait::async_trait;
use quillpost_core::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::multipart;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::body::MultipartField;

/// User agent string for QuillPost.
const USER_AGENT: &str = concat!("quillpost/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Transport Error
// ============================================================================

/// Error type for a single transport round trip.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection-level failure (DNS, TCP, TLS).
    #[error("Connection error: {0}")]
    Connect(String),

    /// The request exceeded the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// Any other transport failure, including client build errors and
    /// malformed header values.
    #[error("Transport error: {0}")]
    Other(String),
}

impl TransportError {
    /// Returns true if retrying the request could plausibly succeed.
    ///
    /// Only connection errors and timeouts are retryable; everything
    /// else is deterministic.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connect(_) | Self::Timeout)
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else {
            Self::Other(err.to_string())
        }
    }
}

// ============================================================================
// Request & Response
// ============================================================================

/// Encoded request body handed to the transport.
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// No body.
    None,
    /// JSON bytes, sent with `Content-Type: application/json`.
    Json(Vec<u8>),
    /// Multipart fields, sent as `multipart/form-data`.
    Multipart(Vec<MultipartField>),
}

/// One fully resolved outbound request.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// HTTP method.
    pub method: Method,
    /// Fully resolved URL.
    pub url: Url,
    /// Merged headers, in application order.
    pub headers: Vec<(String, String)>,
    /// Encoded body.
    pub body: RequestBody,
}

/// Raw result of one round trip.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body bytes.
    pub body: Vec<u8>,
}

// ============================================================================
// Transport Trait
// ============================================================================

/// Performs exactly one HTTP round trip.
///
/// Implementations must not retry, follow auth flows, or interpret
/// status codes; that is the pipeline's job. Test doubles implement
/// this trait to observe outbound requests and script responses.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Executes the request and returns raw status + bytes.
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

// ============================================================================
// HTTP Transport
// ============================================================================

/// reqwest-backed transport with a shared connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    inner: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport with the given per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Ok(Self { inner: client })
    }

    fn build_headers(headers: &[(String, String)]) -> Result<HeaderMap, TransportError> {
        let mut map = HeaderMap::with_capacity(headers.len());
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError::Other(format!("invalid header name {name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| TransportError::Other(format!("invalid header value: {e}")))?;
            map.insert(name, value);
        }
        Ok(map)
    }

    fn build_form(fields: Vec<MultipartField>) -> Result<multipart::Form, TransportError> {
        let mut form = multipart::Form::new();
        for field in fields {
            form = match field {
                MultipartField::Text { name, value } => form.text(name, value),
                MultipartField::Bytes {
                    name,
                    file_name,
                    mime,
                    data,
                } => {
                    let part = multipart::Part::bytes(data)
                        .file_name(file_name)
                        .mime_str(&mime)
                        .map_err(|e| TransportError::Other(format!("invalid MIME type: {e}")))?;
                    form.part(name, part)
                }
            };
        }
        Ok(form)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self
            .inner
            .request(method, request.url)
            .headers(Self::build_headers(&request.headers)?);

        builder = match request.body {
            RequestBody::None => builder,
            RequestBody::Json(bytes) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(bytes),
            RequestBody::Multipart(fields) => builder.multipart(Self::build_form(fields)?),
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        debug!(status, len = body.len(), "Response received");

        Ok(TransportResponse { status, body })
    }
}

// ============================================================================
// Tests
// ============================================================================
