//! Application configuration options

use std::time::Duration;

use crate::config::settings::Settings;
use crate::errors::ClockError;
use crate::http::client::DEFAULT_REQUEST_TIMEOUT;
use crate::sync::orchestrator::SyncOptions;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Base URL of the clock's JSON API
    pub device_base_url: String,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// Sync timing
    pub sync: SyncOptions,

    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            device_base_url: Settings::default().device.base_url,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            sync: SyncOptions::default(),
            max_shutdown_delay: Duration::from_secs(5),
        }
    }
}

impl TryFrom<&Settings> for AppOptions {
    type Error = ClockError;

    /// Fails with `ConfigError` when a timer period or the request timeout is zero
    fn try_from(settings: &Settings) -> Result<Self, Self::Error> {
        let sync = &settings.sync;
        if sync.request_timeout_ms == 0 {
            return Err(ClockError::ConfigError(
                "sync.request_timeout_ms must be non-zero".to_string(),
            ));
        }

        let options = Self {
            device_base_url: settings.device.base_url.clone(),
            request_timeout: Duration::from_millis(sync.request_timeout_ms),
            sync: SyncOptions {
                poll_interval: Duration::from_millis(sync.poll_interval_ms),
                pacing_delay: Duration::from_millis(sync.pacing_delay_ms),
                heartbeat_interval: Duration::from_millis(sync.heartbeat_interval_ms),
                offline_threshold: Duration::from_millis(sync.offline_threshold_ms),
            },
            max_shutdown_delay: Duration::from_secs(5),
        };
        options.sync.validate()?;
        Ok(options)
    }
}
