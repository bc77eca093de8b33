//! REST API client module for the LegacyPrime backend.
//!
//! This module provides the `ApiClient` dispatcher plus typed wrappers for
//! the accounts, transactions, wallet and notification endpoints, and a
//! `HealthMonitor` that tracks backend availability.
//!
//! Authenticated calls carry a JWT bearer token from the injected
//! `CredentialStore`; an expired access token is refreshed once through
//! `accounts/token/refresh/` and the call replayed.

mod accounts;
pub mod client;
pub mod endpoints;
pub mod error;
pub mod health;
mod notifications;
pub mod request;
mod transactions;
mod wallet;

pub use client::{ApiClient, ClientConfig};
pub use error::{ApiError, ErrorKind};
pub use health::{HealthMonitor, HealthStatus};
pub use request::{ApiRequest, Body, FilePart, MultipartBody};
