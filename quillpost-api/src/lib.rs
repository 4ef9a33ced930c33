// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `QuillPost` API
//!
//! Typed endpoint catalog for the `QuillPost` backend and the
//! third-party image host.
//!
//! Each operation is a constructor returning an
//! [`quillpost_core::Endpoint`] parameterized by its request and
//! response types; callers pair it with a body in a
//! [`quillpost_core::RequestEnvelope`] and hand it to
//! [`quillpost_net::ApiClient::send`].
//!
//! - [`users`] - login, registration, current user
//! - [`articles`] - listing, reading, creating, favoriting
//! - [`imagehost`] - multipart uploads and OAuth token refresh against
//!   the image host's own base URL and credential scheme

pub mod articles;
pub mod imagehost;
pub mod users;

pub use imagehost::{ImageHostConfig, ImageHostRefresher};
