//! Polling worker driving the sync cycle

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::http::client::ResourceFetcher;
use crate::sync::orchestrator::{CycleOutcome, PollingOrchestrator};

/// Poller worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Polling interval
    pub interval: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(5000),
        }
    }
}

/// Run the poller worker
///
/// The first cycle starts immediately. Ticks that fall while a cycle is
/// still running are dropped, not queued.
pub async fn run<F: ResourceFetcher>(
    options: &Options,
    orchestrator: &PollingOrchestrator<F>,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) {
    info!("Poller worker starting...");

    let mut ticker = tokio::time::interval(options.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Poller worker shutting down...");
                return;
            }
            _ = ticker.tick() => {
                // Continue with poll
            }
        }

        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Poller worker shutting down mid-cycle...");
                return;
            }
            outcome = orchestrator.run_cycle() => {
                if outcome != CycleOutcome::Completed {
                    debug!("Poll cycle ended: {:?}", outcome);
                }
            }
        }
    }
}
