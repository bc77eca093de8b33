use std::sync::RwLock;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Storage key for the access token
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Storage key for the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// An access/refresh token pair as issued by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Opaque-string storage for the session credentials.
///
/// Implementations never inspect token contents. Writes replace both values
/// at once so a concurrent reader sees either the old pair or the new one.
pub trait CredentialStore: Send + Sync {
    /// Current access token, if any
    fn access_token(&self) -> Option<String>;

    /// Current refresh token, if any
    fn refresh_token(&self) -> Option<String>;

    /// Persist both tokens, overwriting prior values
    fn set(&self, access: &str, refresh: &str) -> Result<()>;

    /// Remove both tokens
    fn clear(&self) -> Result<()>;
}

/// In-process credential store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    tokens: RwLock<Option<TokenPair>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(access: &str, refresh: &str) -> Self {
        Self {
            tokens: RwLock::new(Some(TokenPair {
                access: access.to_string(),
                refresh: refresh.to_string(),
            })),
        }
    }

    fn read(&self) -> Option<TokenPair> {
        match self.tokens.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn write(&self, value: Option<TokenPair>) {
        match self.tokens.write() {
            Ok(mut guard) => *guard = value,
            Err(poisoned) => *poisoned.into_inner() = value,
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn access_token(&self) -> Option<String> {
        self.read().map(|t| t.access)
    }

    fn refresh_token(&self) -> Option<String> {
        self.read().map(|t| t.refresh)
    }

    fn set(&self, access: &str, refresh: &str) -> Result<()> {
        self.write(Some(TokenPair {
            access: access.to_string(),
            refresh: refresh.to_string(),
        }));
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.write(None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_get() {
        let store = MemoryCredentialStore::new();
        assert_eq!(store.access_token(), None);

        store.set("access-1", "refresh-1").unwrap();
        assert_eq!(store.access_token().as_deref(), Some("access-1"));
        assert_eq!(store.refresh_token().as_deref(), Some("refresh-1"));

        store.set("access-2", "refresh-1").unwrap();
        assert_eq!(store.access_token().as_deref(), Some("access-2"));
    }

    #[test]
    fn test_clear() {
        let store = MemoryCredentialStore::with_tokens("a", "r");
        store.clear().unwrap();
        assert_eq!(store.access_token(), None);
        assert_eq!(store.refresh_token(), None);
    }
}
