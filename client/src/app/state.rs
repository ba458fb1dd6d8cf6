//! Application state

use std::sync::Arc;

use tracing::info;

use crate::app::options::AppOptions;
use crate::errors::ClockError;
use crate::events::EventBus;
use crate::http::client::HttpClient;
use crate::sync::orchestrator::PollingOrchestrator;

/// The client object handed to everything that talks to the clock
pub struct AppState {
    /// HTTP client for device communication
    pub http_client: Arc<HttpClient>,

    /// State-change callbacks
    pub events: Arc<EventBus>,

    /// Cached device state and mutation entry points
    pub orchestrator: Arc<PollingOrchestrator>,
}

impl AppState {
    /// Initialize application state without starting any timer
    pub fn init(options: &AppOptions) -> Result<Self, ClockError> {
        info!("Initializing client for {}...", options.device_base_url);

        let http_client = Arc::new(HttpClient::with_timeout(
            &options.device_base_url,
            options.request_timeout,
        )?);
        let events = Arc::new(EventBus::new());
        let orchestrator = Arc::new(PollingOrchestrator::new(
            http_client.clone(),
            events.clone(),
            options.sync.clone(),
        ));

        Ok(Self {
            http_client,
            events,
            orchestrator,
        })
    }
}
