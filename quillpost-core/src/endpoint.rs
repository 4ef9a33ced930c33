//! Endpoint descriptors.
//!
//! An [`Endpoint`] is a declarative, immutable description of one HTTP
//! operation: path, method, headers, auth requirement, and an optional
//! base-URL override for third-party hosts. It is generic over the
//! request and response types so the pipeline can enforce typed
//! encode/decode without the descriptor carrying any behavior.

use std::fmt;
use std::marker::PhantomData;

use url::Url;

// ============================================================================
// Method
// ============================================================================

/// HTTP method for an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET request.
    Get,
    /// POST request.
    Post,
    /// PUT request.
    Put,
    /// DELETE request.
    Delete,
}

impl Method {
    /// Returns the wire representation of this method.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Body Encoding
// ============================================================================

/// Wire format for an endpoint's request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyEncoding {
    /// JSON-encoded body with `Content-Type: application/json`.
    #[default]
    Json,
    /// `multipart/form-data` body for binary payloads such as images.
    Multipart,
}

// ============================================================================
// Endpoint
// ============================================================================

/// Declarative description of one HTTP operation.
///
/// Generic over the request type `Req` and response type `Res`.
/// Construction never fails; URL validity is checked by the pipeline
/// when the descriptor is resolved against a base URL.
pub struct Endpoint<Req, Res> {
    path: String,
    method: Method,
    requires_auth: bool,
    headers: Vec<(String, String)>,
    base_url_override: Option<Url>,
    encoding: BodyEncoding,
    _marker: PhantomData<fn(Req) -> Res>,
}

impl<Req, Res> Endpoint<Req, Res> {
    /// Creates a new endpoint for the given method and path.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method,
            requires_auth: false,
            headers: Vec::new(),
            base_url_override: None,
            encoding: BodyEncoding::Json,
            _marker: PhantomData,
        }
    }

    /// Shorthand for a GET endpoint.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    /// Shorthand for a POST endpoint.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    /// Shorthand for a PUT endpoint.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    /// Shorthand for a DELETE endpoint.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Marks this endpoint as requiring bearer authentication.
    pub fn with_auth(mut self) -> Self {
        self.requires_auth = true;
        self
    }

    /// Adds a custom header to this endpoint.
    ///
    /// Endpoint headers override the pipeline's default headers on key
    /// collision; the `Authorization` header injected for authenticated
    /// calls overrides both.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Overrides the pipeline's default base URL for this endpoint.
    ///
    /// Used for third-party hosts with their own credential schemes.
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url_override = Some(base_url);
        self
    }

    /// Sets the body encoding for this endpoint.
    pub fn with_encoding(mut self, encoding: BodyEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Returns the relative path of this endpoint.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the HTTP method.
    pub fn method(&self) -> Method {
        self.method
    }

    /// Returns true if this endpoint requires bearer authentication.
    pub fn requires_auth(&self) -> bool {
        self.requires_auth
    }

    /// Returns the endpoint-declared custom headers.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Returns the base-URL override, if any.
    pub fn base_url_override(&self) -> Option<&Url> {
        self.base_url_override.as_ref()
    }

    /// Returns the body encoding.
    pub fn encoding(&self) -> BodyEncoding {
        self.encoding
    }

    /// Two descriptors describe the same operation when `(path, method)`
    /// match after variable substitution.
    pub fn same_operation<R2, S2>(&self, other: &Endpoint<R2, S2>) -> bool {
        self.path == other.path && self.method == other.method
    }

    /// Derives a new endpoint by appending a suffix to this endpoint's
    /// path, keeping its auth requirement, headers, and base-URL
    /// override.
    ///
    /// Used for operations addressed relative to a resource, such as a
    /// favorite endpoint derived from an article endpoint.
    pub fn derive<Req2, Res2>(&self, method: Method, suffix: &str) -> Endpoint<Req2, Res2> {
        Endpoint {
            path: format!("{}{}", self.path, suffix),
            method,
            requires_auth: self.requires_auth,
            headers: self.headers.clone(),
            base_url_override: self.base_url_override.clone(),
            encoding: BodyEncoding::Json,
            _marker: PhantomData,
        }
    }
}

// Manual impls so `Req`/`Res` need not be Clone/Debug themselves.

impl<Req, Res> Clone for Endpoint<Req, Res> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            method: self.method,
            requires_auth: self.requires_auth,
            headers: self.headers.clone(),
            base_url_override: self.base_url_override.clone(),
            encoding: self.encoding,
            _marker: PhantomData,
        }
    }
}

impl<Req, Res> fmt::Debug for Endpoint<Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("requires_auth", &self.requires_auth)
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
