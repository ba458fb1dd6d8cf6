//! Liveness worker

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::info;

use crate::http::client::ResourceFetcher;
use crate::sync::heartbeat::DEFAULT_HEARTBEAT_INTERVAL;
use crate::sync::orchestrator::PollingOrchestrator;

/// Heartbeat worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Evaluation interval
    pub interval: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            interval: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }
}

/// Run the heartbeat worker
///
/// Runs on its own short timer so a silent device is reported well before
/// the next poll cycle would notice.
pub async fn run<F: ResourceFetcher>(
    options: &Options,
    orchestrator: &PollingOrchestrator<F>,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) {
    info!("Heartbeat worker starting...");

    let mut ticker = tokio::time::interval(options.interval);

    loop {
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Heartbeat worker shutting down...");
                return;
            }
            _ = ticker.tick() => {
                orchestrator.check_heartbeat();
            }
        }
    }
}
