//! Authenticated client for the LegacyPrime investment platform API.
//!
//! - `api`: request dispatcher with token refresh, endpoint wrappers, errors
//! - `auth`: credential stores (memory, keyring, session file) and session events
//! - `config`: base URL, timeout and persisted settings
//! - `models`: request and response payloads

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError, ClientConfig, ErrorKind};
pub use auth::{CredentialStore, SessionEvent};
