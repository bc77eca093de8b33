//! Backend health tracking.
//!
//! `HealthMonitor` remembers the outcome of the last probe and broadcasts a
//! `HealthStatus` whenever the backend flips between healthy and unhealthy.
//! The hosted backend sleeps when idle, so `warmup` allows a longer first
//! request than the regular probe.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::client::HEALTH_CHECK_TIMEOUT_SECS;
use super::{ApiClient, ApiError};

/// Period between background probes
pub const HEALTH_CHECK_INTERVAL_SECS: u64 = 30;

/// Timeout for the wake-up request sent to a cold backend
pub const WARMUP_TIMEOUT_SECS: u64 = 10;

const MAINTENANCE_MESSAGE: &str =
    "Service is currently undergoing maintenance. Please try again later.";
const DEGRADED_MESSAGE: &str = "The service is experiencing issues. Our team has been notified.";
const UNREACHABLE_MESSAGE: &str =
    "Unable to connect to the service. Please check your internet connection.";
const READY_MESSAGE: &str = "Backend is ready";
const WARMING_MESSAGE: &str = "Backend is still initializing. Please wait...";

const HEALTH_CHANNEL_CAPACITY: usize = 8;

/// Outcome of the most recent health probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    pub is_healthy: bool,
    pub last_checked: DateTime<Utc>,
    pub message: Option<String>,
}

impl HealthStatus {
    fn new(is_healthy: bool, message: Option<&str>) -> Self {
        Self {
            is_healthy,
            last_checked: Utc::now(),
            message: message.map(str::to_string),
        }
    }
}

impl Default for HealthStatus {
    /// Assume healthy until a probe says otherwise.
    fn default() -> Self {
        Self::new(true, None)
    }
}

fn failure_message(status: StatusCode) -> &'static str {
    if status == StatusCode::SERVICE_UNAVAILABLE {
        MAINTENANCE_MESSAGE
    } else {
        DEGRADED_MESSAGE
    }
}

/// Tracks backend health for one `ApiClient`. Clones share state.
#[derive(Clone)]
pub struct HealthMonitor {
    client: ApiClient,
    status: Arc<RwLock<HealthStatus>>,
    events: broadcast::Sender<HealthStatus>,
}

impl HealthMonitor {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            status: Arc::new(RwLock::new(HealthStatus::default())),
            events: broadcast::channel(HEALTH_CHANNEL_CAPACITY).0,
        }
    }

    pub fn status(&self) -> HealthStatus {
        match self.status.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Receive a status each time the backend changes between healthy and
    /// unhealthy.
    pub fn subscribe(&self) -> broadcast::Receiver<HealthStatus> {
        self.events.subscribe()
    }

    /// Probe the backend once and record the result.
    pub async fn check(&self) -> HealthStatus {
        let timeout = Duration::from_secs(HEALTH_CHECK_TIMEOUT_SECS);
        match self.client.probe_health(timeout).await {
            Ok(status) if status.is_success() => self.update(true, None),
            Ok(status) => self.update(false, Some(failure_message(status))),
            Err(e) => {
                debug!(error = %e, "Health probe failed");
                self.update(false, Some(UNREACHABLE_MESSAGE))
            }
        }
    }

    /// Wake a sleeping backend, allowing it longer than a regular probe.
    pub async fn warmup(&self) -> Result<(), ApiError> {
        let timeout = Duration::from_secs(WARMUP_TIMEOUT_SECS);
        let outcome = match self.client.probe_health(timeout).await {
            Ok(status) if status.is_success() => Ok(()),
            Ok(status) => Err(ApiError::from_body(status.as_u16(), "")),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => {
                info!("Backend is ready");
                self.update(true, Some(READY_MESSAGE));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, status = e.status, "Backend warmup failed");
                self.update(false, Some(WARMING_MESSAGE));
                Err(e)
            }
        }
    }

    /// Probe now and then every `period` until the handle is aborted.
    pub fn spawn(&self, period: Duration) -> JoinHandle<()> {
        let monitor = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                monitor.check().await;
            }
        })
    }

    fn update(&self, is_healthy: bool, message: Option<&str>) -> HealthStatus {
        let next = HealthStatus::new(is_healthy, message);
        let changed = {
            let mut guard = match self.status.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let changed = guard.is_healthy != is_healthy;
            *guard = next.clone();
            changed
        };

        if changed {
            if is_healthy {
                info!("Backend is healthy again");
            } else {
                warn!(message = ?next.message, "Backend is unhealthy");
            }
            // No subscribers is fine
            let _ = self.events.send(next.clone());
        }
        next
    }
}
