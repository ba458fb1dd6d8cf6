//! Main application run loop

use std::future::Future;

use tracing::{error, info};

use crate::app::options::AppOptions;
use crate::app::report::register_console_reporters;
use crate::app::state::AppState;
use crate::errors::ClockError;

/// Run the sync client until `shutdown_signal` resolves
pub async fn run(
    options: AppOptions,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ClockError> {
    let app_state = AppState::init(&options)?;
    register_console_reporters(&app_state.events);

    info!(
        "Syncing {} every {:?} (pacing {:?})",
        app_state.http_client.base_url(),
        options.sync.poll_interval,
        options.sync.pacing_delay
    );
    let sync_handle = app_state.orchestrator.clone().start();

    shutdown_signal.await;
    info!("Shutdown signal received, shutting down...");

    match tokio::time::timeout(options.max_shutdown_delay, sync_handle.shutdown()).await {
        Ok(result) => result,
        Err(_) => {
            error!(
                "Shutdown timed out after {:?}, abandoning workers...",
                options.max_shutdown_delay
            );
            Err(ClockError::ShutdownError("timed out".to_string()))
        }
    }
}
