// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `QuillPost` Net
//!
//! HTTP transport and client pipeline for the `QuillPost` networking
//! substrate.
//!
//! ## Transport
//!
//! The [`Transport`] trait performs exactly one network round trip and
//! returns raw status + bytes. [`HttpTransport`] is the reqwest-backed
//! implementation; tests substitute their own.
//!
//! ## Pipeline
//!
//! [`ApiClient::send`] orchestrates URL construction, header merging,
//! auth-token injection, body encoding, transport invocation, status
//! interpretation, and typed body decoding. Authenticated calls obtain
//! their bearer token through the [`TokenSource`] seam; on a 401/403
//! the pipeline performs exactly one refresh-then-retry cycle.
//!
//! ## Example
//!
//! ```ignore
//! use quillpost_core::{ClientConfig, Endpoint, RequestEnvelope};
//! use quillpost_net::ApiClient;
//!
//! let config = ClientConfig::new("https://api.quillpost.dev".parse()?);
//! let client = ApiClient::new(config)?;
//!
//! let endpoint: Endpoint<LoginRequest, LoginResponse> =
//!     Endpoint::post("/users/login");
//! let user = client
//!     .send(RequestEnvelope::new(endpoint).with_body(credentials))
//!     .await?;
//! ```

pub mod auth;
pub mod body;
pub mod client;
pub mod retry;
pub mod transport;

// Re-export key types at crate root

pub use auth::TokenSource;
pub use body::{IntoMultipart, MultipartField};
pub use client::ApiClient;
pub use retry::RetryPolicy;
pub use transport::{
    HttpTransport, RequestBody, Transport, TransportError, TransportRequest, TransportResponse,
};
