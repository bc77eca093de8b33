//! Request dispatcher for the LegacyPrime REST API.
//!
//! `ApiClient` attaches the bearer token from the credential store, turns
//! every failure into an `ApiError`, and recovers from an expired access
//! token by refreshing once and replaying the request. Typed endpoint
//! wrappers live in sibling modules as further `impl ApiClient` blocks.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::auth::{events, CredentialStore, SessionEvent};
use crate::config::{DEFAULT_TIMEOUT_SECS, LOCAL_BASE_URL};
use crate::models::RefreshResponse;

use super::endpoints::{self, join_url};
use super::request::{ApiRequest, Body};
use super::ApiError;

/// Timeout for liveness probes, kept short so a dead backend is noticed fast.
pub const HEALTH_CHECK_TIMEOUT_SECS: u64 = 5;

/// Connection settings for an `ApiClient`.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every relative path is joined onto, e.g. `https://host/api`
    pub base_url: String,
    /// Default timeout for each request
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: LOCAL_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// API client for LegacyPrime.
/// Clone is cheap: the connection pool, store, refresh gate and event
/// channel are all shared between clones.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    config: ClientConfig,
    store: Arc<dyn CredentialStore>,
    refresh_gate: Arc<Mutex<()>>,
    events: broadcast::Sender<SessionEvent>,
}

impl ApiClient {
    pub fn new(config: ClientConfig, store: Arc<dyn CredentialStore>) -> Result<Self, ApiError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::request(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            store,
            refresh_gate: Arc::new(Mutex::new(())),
            events: events::channel(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Receive session changes (login, refresh, logout, authentication loss).
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// True when an access token is stored. The token may still be expired.
    pub fn is_authenticated(&self) -> bool {
        self.store.access_token().is_some()
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    pub(crate) fn store_tokens(&self, access: &str, refresh: &str) -> Result<(), ApiError> {
        self.store.set(access, refresh).map_err(|e| {
            warn!(error = %e, "Failed to store session tokens");
            ApiError::request(format!("Failed to store session tokens: {}", e))
        })
    }

    /// Clear credentials and tell subscribers, once per lost session.
    fn lose_session(&self) {
        let had_session = self.store.access_token().is_some() || self.store.refresh_token().is_some();
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear credentials");
        }
        if had_session {
            warn!("Authentication lost, credentials cleared");
            self.emit(SessionEvent::AuthenticationLost);
        }
    }

    /// Issue `request` and decode the response body into `T`.
    ///
    /// An authenticated request answered with 401 triggers one token refresh
    /// and one replay. Empty and 204/205 responses decode from JSON `null`.
    pub async fn send<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, ApiError> {
        let token = if request.authenticated {
            self.store.access_token()
        } else {
            None
        };

        let response = self.execute(request, token.as_deref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED || !request.authenticated {
            return Self::decode(response).await;
        }

        debug!(path = %request.path, "Access token rejected, refreshing");
        let fresh = match self.refresh_access_token(token.as_deref()).await {
            Ok(fresh) => fresh,
            Err(RefreshFailure::NoRefreshToken) => {
                let body = Self::read_body(response).await;
                self.lose_session();
                return Err(ApiError::authentication_lost(&body));
            }
            Err(RefreshFailure::Api(e)) => return Err(e),
        };

        let retried = self.execute(request, Some(&fresh)).await?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            let body = Self::read_body(retried).await;
            self.lose_session();
            return Err(ApiError::authentication_lost(&body));
        }
        Self::decode(retried).await
    }

    /// Liveness probe. `Ok(false)` when the backend answers with an error
    /// status; `Err` only when it could not be reached.
    pub async fn health_check(&self) -> Result<bool, ApiError> {
        let status = self
            .probe_health(Duration::from_secs(HEALTH_CHECK_TIMEOUT_SECS))
            .await?;
        Ok(status.is_success())
    }

    /// Unauthenticated GET of the health endpoint, returning its status.
    pub(crate) async fn probe_health(&self, timeout: Duration) -> Result<StatusCode, ApiError> {
        let request = ApiRequest::get(endpoints::HEALTH).public().timeout(timeout);
        let response = self.execute(&request, None).await?;
        debug!(status = %response.status(), "Health check response received");
        Ok(response.status())
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// Serialized behind the refresh gate: a caller whose `stale` token has
    /// already been replaced by someone else reuses the current one.
    async fn refresh_access_token(&self, stale: Option<&str>) -> Result<String, RefreshFailure> {
        let _gate = self.refresh_gate.lock().await;

        if let Some(current) = self.store.access_token() {
            if stale != Some(current.as_str()) {
                debug!("Token already refreshed by another request");
                return Ok(current);
            }
        }

        let refresh = self
            .store
            .refresh_token()
            .ok_or(RefreshFailure::NoRefreshToken)?;

        let request = ApiRequest::post(endpoints::REFRESH_TOKEN)
            .public()
            .json(&json!({ "refresh": refresh }))?;
        let response = self.execute(&request, None).await?;
        let status = response.status();

        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            let body = Self::read_body(response).await;
            warn!(status = status.as_u16(), "Refresh token rejected");
            self.lose_session();
            return Err(ApiError::authentication_lost(&body).into());
        }
        if !status.is_success() {
            let body = Self::read_body(response).await;
            warn!(status = status.as_u16(), "Token refresh failed, keeping credentials");
            return Err(ApiError::from_body(status.as_u16(), &body).into());
        }

        let refreshed: RefreshResponse = Self::decode(response).await?;
        let next_refresh = refreshed.refresh.as_deref().unwrap_or(&refresh);
        self.store_tokens(&refreshed.access, next_refresh)?;
        info!("Access token refreshed");
        self.emit(SessionEvent::TokensRefreshed);
        Ok(refreshed.access)
    }

    /// Build and send one attempt. Only transport failures are errors here.
    async fn execute(&self, request: &ApiRequest, token: Option<&str>) -> Result<Response, ApiError> {
        let url = join_url(&self.config.base_url, &request.path);
        let multipart = matches!(request.body, Body::Multipart(_));

        let mut builder = self.client.request(request.method.clone(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            // The transport owns the multipart boundary
            if multipart && name.eq_ignore_ascii_case(header::CONTENT_TYPE.as_str()) {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        if !request.is_safe() {
            builder = match &request.body {
                Body::Empty => builder,
                Body::Json(value) => builder.json(value),
                Body::Multipart(body) => builder.multipart(body.to_form()?),
            };
        }

        debug!(
            method = %request.method,
            url = %url,
            authenticated = token.is_some(),
            "Sending request"
        );
        builder.send().await.map_err(|e| {
            warn!(method = %request.method, url = %url, error = %e, "Request failed without a response");
            ApiError::from_transport(e)
        })
    }

    /// Turn a response into `T` or a normalized error.
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let status = response.status();
        let body = response.text().await.map_err(ApiError::from_transport)?;

        if !status.is_success() {
            debug!(status = status.as_u16(), "Request returned error status");
            return Err(ApiError::from_body(status.as_u16(), &body));
        }

        if status == StatusCode::NO_CONTENT
            || status == StatusCode::RESET_CONTENT
            || body.trim().is_empty()
        {
            return serde_json::from_value(Value::Null).map_err(|e| {
                ApiError::invalid_response(
                    status.as_u16(),
                    format!("Empty response cannot be read as the expected type: {}", e),
                )
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| ApiError::invalid_response(status.as_u16(), e.to_string()))
    }

    async fn read_body(response: Response) -> String {
        response.text().await.unwrap_or_default()
    }
}

/// Why a refresh did not produce a token.
enum RefreshFailure {
    /// Nothing to refresh with; the caller decides how to report it
    NoRefreshToken,
    Api(ApiError),
}

impl From<ApiError> for RefreshFailure {
    fn from(err: ApiError) -> Self {
        RefreshFailure::Api(err)
    }
}
