//! Application configuration management.
//!
//! This module resolves the API base URL and request timeout and handles
//! loading and saving the persisted configuration (base URL override,
//! timeout, last used email, credential backend).
//!
//! Configuration is stored at `~/.config/legacyprime/config.json`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::api::ClientConfig;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "legacyprime";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable that overrides the API base URL
pub const BASE_URL_ENV: &str = "LEGACYPRIME_API_BASE_URL";

/// Environment variable selecting production or local defaults
pub const ENVIRONMENT_ENV: &str = "LEGACYPRIME_ENV";

/// Environment variable that overrides the request timeout, in seconds
pub const TIMEOUT_ENV: &str = "LEGACYPRIME_TIMEOUT_SECS";

pub const PRODUCTION_BASE_URL: &str = "https://legacyprime.onrender.com/api";
pub const LOCAL_BASE_URL: &str = "http://localhost:8000/api";

/// Default HTTP request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Deployment environment, which picks the default base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    Production,
    #[default]
    Local,
}

impl Environment {
    pub fn from_env() -> Self {
        Self::parse(std::env::var(ENVIRONMENT_ENV).ok().as_deref())
    }

    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            _ => Environment::Local,
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Environment::Production => PRODUCTION_BASE_URL,
            Environment::Local => LOCAL_BASE_URL,
        }
    }
}

/// Where session tokens are persisted between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialBackend {
    Keyring,
    #[default]
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub last_email: Option<String>,
    #[serde(default)]
    pub credential_backend: CredentialBackend,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Base URL from the environment override, this config, or the
    /// environment default, in that order.
    pub fn base_url(&self) -> String {
        resolve_base_url(
            std::env::var(BASE_URL_ENV).ok().as_deref(),
            self.api_base_url.as_deref(),
            Environment::from_env(),
        )
    }

    pub fn timeout(&self) -> Duration {
        let from_env = std::env::var(TIMEOUT_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok());
        Duration::from_secs(
            from_env
                .or(self.timeout_secs)
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        )
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url(),
            timeout: self.timeout(),
        }
    }
}

/// Pick the first non-blank candidate and make sure it has a scheme.
pub fn resolve_base_url(
    override_url: Option<&str>,
    configured: Option<&str>,
    environment: Environment,
) -> String {
    let chosen = [override_url, configured]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|v| !v.is_empty())
        .unwrap_or_else(|| environment.default_base_url());
    ensure_protocol(chosen).trim_end_matches('/').to_string()
}

/// Add a scheme when missing: `http://` for loopback hosts, `https://`
/// otherwise. Protocol-relative `//host` URLs get `https:`.
pub fn ensure_protocol(url: &str) -> String {
    let url = url.trim();
    if url.is_empty() || has_scheme(url) {
        return url.to_string();
    }
    if let Some(rest) = url.strip_prefix("//") {
        return format!("https://{}", rest);
    }
    if url.contains("localhost") || url.contains("127.0.0.1") {
        format!("http://{}", url)
    } else {
        format!("https://{}", url)
    }
}

/// `scheme:` where scheme is a letter followed by letters, digits, `+`, `-`, `.`
fn has_scheme(url: &str) -> bool {
    let Some((scheme, _)) = url.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    // host:port without a scheme, e.g. "localhost:8000"
    if url[scheme.len() + 1..].chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_protocol() {
        assert_eq!(ensure_protocol("localhost:8000/api"), "http://localhost:8000/api");
        assert_eq!(ensure_protocol("127.0.0.1:8000/api"), "http://127.0.0.1:8000/api");
        assert_eq!(ensure_protocol("api.example.com"), "https://api.example.com");
        assert_eq!(ensure_protocol("//cdn.example.com/api"), "https://cdn.example.com/api");
        assert_eq!(ensure_protocol("http://api.example.com"), "http://api.example.com");
        assert_eq!(ensure_protocol("https://localhost/api"), "https://localhost/api");
        assert_eq!(ensure_protocol(""), "");
    }

    #[test]
    fn test_resolve_base_url_precedence() {
        assert_eq!(
            resolve_base_url(Some("api.example.com/api/"), Some("other.com"), Environment::Local),
            "https://api.example.com/api"
        );
        assert_eq!(
            resolve_base_url(Some("   "), Some("localhost:9000/api"), Environment::Production),
            "http://localhost:9000/api"
        );
        assert_eq!(
            resolve_base_url(None, None, Environment::Production),
            PRODUCTION_BASE_URL
        );
        assert_eq!(resolve_base_url(None, None, Environment::Local), LOCAL_BASE_URL);
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!(Environment::parse(Some("production")), Environment::Production);
        assert_eq!(Environment::parse(Some(" PROD ")), Environment::Production);
        assert_eq!(Environment::parse(Some("development")), Environment::Local);
        assert_eq!(Environment::parse(None), Environment::Local);
    }

    #[test]
    fn test_config_defaults_deserialize() {
        let config: Config = serde_json::from_str(r#"{"api_base_url": "api.example.com"}"#).unwrap();
        assert_eq!(config.credential_backend, CredentialBackend::File);
        assert!(config.timeout_secs.is_none());

        let config: Config = serde_json::from_str(r#"{"credential_backend": "keyring"}"#).unwrap();
        assert_eq!(config.credential_backend, CredentialBackend::Keyring);
        assert_eq!(Config::default().credential_backend, CredentialBackend::File);
    }
}
