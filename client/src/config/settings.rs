//! Settings file management

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::ClockError;
use crate::logs::LogLevel;

/// Environment variable overriding the device URL
pub const DEVICE_URL_ENV: &str = "LEDCLOCK_URL";

/// Client settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Directory for log files
    #[serde(default)]
    pub log_dir: Option<String>,

    /// Emit JSON log lines
    #[serde(default)]
    pub log_json: bool,

    /// Device configuration
    #[serde(default)]
    pub device: DeviceSettings,

    /// Sync timing
    #[serde(default)]
    pub sync: SyncSettings,
}

impl Settings {
    /// Read settings from a JSON file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ClockError> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path).await?;
        serde_json::from_str(&contents).map_err(|e| {
            ClockError::ConfigError(format!("{}: {}", path.display(), e))
        })
    }
}

/// Device address settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSettings {
    /// Base URL of the clock's JSON API
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    std::env::var(DEVICE_URL_ENV).unwrap_or_else(|_| "http://ledclock.local/api/v1".to_string())
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// Sync timing settings, all in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_pacing_delay")]
    pub pacing_delay_ms: u64,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_ms: u64,

    #[serde(default = "default_offline_threshold")]
    pub offline_threshold_ms: u64,
}

fn default_poll_interval() -> u64 {
    5000
}

fn default_pacing_delay() -> u64 {
    200
}

fn default_request_timeout() -> u64 {
    3000
}

fn default_heartbeat_interval() -> u64 {
    250
}

fn default_offline_threshold() -> u64 {
    5000
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            pacing_delay_ms: default_pacing_delay(),
            request_timeout_ms: default_request_timeout(),
            heartbeat_interval_ms: default_heartbeat_interval(),
            offline_threshold_ms: default_offline_threshold(),
        }
    }
}
