//! Advisory service health: cookie and disk-space warnings.
//!
//! Health never blocks an operation. A failed poll keeps the last-known
//! status (stale but available) and is only logged.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::{ApiClient, HealthReport};

/// Default polling interval.
pub const DEFAULT_HEALTH_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Current advisory warnings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthStatus {
    pub credential_warning: Option<String>,
    pub disk_space_warning: Option<String>,
}

impl HealthStatus {
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        self.credential_warning.is_some() || self.disk_space_warning.is_some()
    }
}

impl From<HealthReport> for HealthStatus {
    fn from(report: HealthReport) -> Self {
        Self {
            credential_warning: report.cookie_problem,
            disk_space_warning: report.disk_problem,
        }
    }
}

/// Clonable handle to the process-wide health status.
#[derive(Debug, Clone, Default)]
pub struct SharedHealth {
    inner: Arc<RwLock<HealthStatus>>,
}

impl SharedHealth {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current status.
    #[must_use]
    pub fn snapshot(&self) -> HealthStatus {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn replace(&self, status: HealthStatus) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = status;
    }

    /// Records a disk-space warning reported outside a health poll.
    pub fn set_disk_space_warning(&self, message: impl Into<String>) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .disk_space_warning = Some(message.into());
    }
}

/// Polls the health endpoint into a [`SharedHealth`].
#[derive(Debug, Clone)]
pub struct HealthMonitor {
    api: ApiClient,
    shared: SharedHealth,
}

impl HealthMonitor {
    #[must_use]
    pub fn new(api: ApiClient, shared: SharedHealth) -> Self {
        Self { api, shared }
    }

    #[must_use]
    pub fn shared(&self) -> &SharedHealth {
        &self.shared
    }

    /// Polls once. On failure the previous status is returned unchanged.
    pub async fn refresh(&self) -> HealthStatus {
        match self.api.health().await {
            Ok(report) => {
                let status = HealthStatus::from(report);
                debug!(
                    credential_warning = status.credential_warning.is_some(),
                    disk_space_warning = status.disk_space_warning.is_some(),
                    "health refreshed"
                );
                self.shared.replace(status.clone());
                status
            }
            Err(error) => {
                warn!(error = %error, "health check failed; keeping last-known status");
                self.shared.snapshot()
            }
        }
    }

    /// Spawns periodic polling. The first poll runs immediately.
    ///
    /// A zero `interval` falls back to [`DEFAULT_HEALTH_INTERVAL`]. Polling
    /// ends when the returned [`HealthTask`] is stopped or dropped.
    #[must_use]
    pub fn start(self, interval: Duration) -> HealthTask {
        let interval = polling_interval(interval);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.refresh().await;
            }
        });
        debug!(interval_secs = interval.as_secs(), "health polling started");
        HealthTask {
            handle: Some(handle),
        }
    }
}

/// Running health poller; stops on [`HealthTask::stop`] or drop.
#[derive(Debug)]
pub struct HealthTask {
    handle: Option<JoinHandle<()>>,
}

impl HealthTask {
    /// Stops polling. Safe to call more than once.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("health polling stopped");
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for HealthTask {
    fn drop(&mut self) {
        self.stop();
    }
}

fn polling_interval(requested: Duration) -> Duration {
    if requested.is_zero() {
        warn!("health interval of zero requested; using the default");
        DEFAULT_HEALTH_INTERVAL
    } else {
        requested
    }
}
