// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `QuillPost` Core
//!
//! Core types for the `QuillPost` networking substrate.
//!
//! This crate provides the pure data model shared by the transport,
//! pipeline, and auth crates:
//!
//! - [`Endpoint`] - Declarative description of one HTTP operation
//! - [`RequestEnvelope`] - An endpoint paired with an optional body and
//!   an optional explicit bearer token
//! - [`ClientConfig`] - Process-wide pipeline configuration
//! - [`TokenRecord`] - A bearer token and its expiration instant
//! - [`ApiError`] - The typed error surface callers consume
//!
//! Everything here is immutable once constructed; construction never
//! performs I/O.

pub mod config;
pub mod endpoint;
pub mod envelope;
pub mod error;
pub mod token;

// Re-export key types at crate root

pub use config::{ClientConfig, ClientConfigBuilder};
pub use endpoint::{BodyEncoding, Endpoint, Method};
pub use envelope::RequestEnvelope;
pub use error::{ApiError, RefreshError};
pub use token::{TokenRecord, EXPIRY_GRACE_SECS};
