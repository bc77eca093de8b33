//! Authentication module for session credentials.
//!
//! This module provides:
//! - `CredentialStore`: the storage trait the API client is built on
//! - `MemoryCredentialStore`: in-process storage (tests, one-shot commands)
//! - `KeyringCredentialStore`: OS-level storage via keyring
//! - `FileCredentialStore`: JSON session file, optionally passphrase-sealed
//! - `SessionEvent`: broadcast when the session changes

pub mod credentials;
pub mod events;
pub mod session;
pub mod store;
pub mod vault;

pub use credentials::KeyringCredentialStore;
pub use events::SessionEvent;
pub use session::{FileCredentialStore, SessionData};
pub use store::{CredentialStore, MemoryCredentialStore, TokenPair};
