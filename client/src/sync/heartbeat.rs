//! Liveness derived from the recency of the last successful update

use std::time::Duration;

use tokio::time::Instant;

/// Silence after which the device is considered offline
pub const DEFAULT_OFFLINE_THRESHOLD: Duration = Duration::from_millis(5000);

/// How often liveness is re-evaluated
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(250);

/// Pure online/offline judgement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatMonitor {
    threshold: Duration,
}

impl Default for HeartbeatMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_OFFLINE_THRESHOLD)
    }
}

impl HeartbeatMonitor {
    pub fn new(threshold: Duration) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Online iff a success was recorded no longer than `threshold` ago
    pub fn is_online(&self, now: Instant, last_success: Option<Instant>) -> bool {
        match last_success {
            Some(last) => now.saturating_duration_since(last) <= self.threshold,
            None => false,
        }
    }
}
