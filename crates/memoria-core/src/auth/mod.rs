//! Authentication module for managing user sessions and credentials.
//!
//! This module provides:
//! - `Session`: token-based session persisted next to the cache
//! - `CredentialStore`: OS-level password storage via keyring
//!
//! Tokens are treated as expired after 12 hours; the backend may reject them
//! earlier, which the navigator handles as an auth failure.

pub mod credentials;
pub mod session;

pub use credentials::CredentialStore;
pub use session::{Session, SessionData};
