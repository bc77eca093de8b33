use anyhow::{Context, Result};
use keyring::Entry;
use tracing::warn;

use super::store::{CredentialStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};

/// Default keychain service name
pub const SERVICE_NAME: &str = "legacyprime";

/// Token storage in the OS keychain, one entry per token.
pub struct KeyringCredentialStore {
    access: Entry,
    refresh: Entry,
}

impl KeyringCredentialStore {
    pub fn new() -> Result<Self> {
        Self::with_service(SERVICE_NAME)
    }

    pub fn with_service(service: &str) -> Result<Self> {
        let access = Entry::new(service, ACCESS_TOKEN_KEY)
            .context("Failed to create keyring entry for access token")?;
        let refresh = Entry::new(service, REFRESH_TOKEN_KEY)
            .context("Failed to create keyring entry for refresh token")?;
        Ok(Self { access, refresh })
    }

    fn read(entry: &Entry, name: &str) -> Option<String> {
        match entry.get_password() {
            Ok(value) => Some(value),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                warn!(key = name, error = %e, "Failed to read token from keychain");
                None
            }
        }
    }

    fn delete(entry: &Entry) -> Result<()> {
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn access_token(&self) -> Option<String> {
        Self::read(&self.access, ACCESS_TOKEN_KEY)
    }

    fn refresh_token(&self) -> Option<String> {
        Self::read(&self.refresh, REFRESH_TOKEN_KEY)
    }

    fn set(&self, access: &str, refresh: &str) -> Result<()> {
        let previous = self.access.get_password().ok();
        self.access
            .set_password(access)
            .context("Failed to store access token in keychain")?;

        if let Err(e) = self.refresh.set_password(refresh) {
            // Put the old access token back so the pair stays consistent
            let _ = match previous {
                Some(ref old) => self.access.set_password(old),
                None => self.access.delete_credential(),
            };
            return Err(e).context("Failed to store refresh token in keychain");
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let access = Self::delete(&self.access);
        let refresh = Self::delete(&self.refresh);
        access.and(refresh)
    }
}
