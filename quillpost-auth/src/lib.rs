// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `QuillPost` Auth
//!
//! Authentication-token lifecycle for the `QuillPost` networking
//! substrate.
//!
//! ## Token Store
//!
//! [`TokenStore`] owns the current [`quillpost_core::TokenRecord`] and
//! is the only component permitted to mutate it. The record is held in
//! memory behind a lock and written through to a [`TokenPersistence`]
//! backend under two keys, `token` and `expiresAt` (RFC 3339). Three
//! backends ship:
//!
//! - [`KeyringPersistence`] - system keychain (the production backend)
//! - [`FilePersistence`] - `~/.quillpost/token.json`, owner-only on unix
//! - [`MemoryPersistence`] - process-local, for tests and ephemeral use
//!
//! ## Refresh Coordinator
//!
//! [`RefreshCoordinator`] serializes renewal of expiring credentials:
//! concurrent callers of [`RefreshCoordinator::ensure_fresh`] share a
//! single in-flight refresh attempt rather than issuing duplicates.
//!
//! ## Session
//!
//! [`AuthSession`] wires a store and an optional coordinator into the
//! pipeline's `TokenSource` seam.

pub mod error;
pub mod persistence;
pub mod refresh;
pub mod session;
pub mod store;

// Re-export key types at crate root

pub use error::PersistenceError;
pub use persistence::{
    keys, FilePersistence, KeyringPersistence, MemoryPersistence, TokenPersistence,
};
pub use refresh::{RefreshCoordinator, RefreshedToken, TokenRefresher};
pub use session::AuthSession;
pub use store::TokenStore;
