//! Device state synchronization

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use clock_models::{Animations, ConfigMap, ConfigSetResult};
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::errors::ClockError;
use crate::events::{DeviceEvent, EventBus};
use crate::http::client::{HttpClient, ResourceFetcher};
use crate::http::device::{
    config_query, trigger_ota_query, ANIMATIONS_PATH, REBOOT_PATH, SET_PATH, SWITCH_OTA_PATH,
    TRIGGER_OTA_PATH,
};
use crate::sync::heartbeat::{HeartbeatMonitor, DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_OFFLINE_THRESHOLD};
use crate::sync::reconcile::reconcile_config;
use crate::sync::state::{DeviceState, Resource};
use crate::workers::{heartbeat, poller};

/// Sync timing options
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Period of the poll cycle timer
    pub poll_interval: Duration,

    /// Pause between two consecutive fetches of one cycle
    ///
    /// The clock's HTTP server handles very few concurrent sockets; spacing
    /// the requests keeps a cycle from starving other clients.
    pub pacing_delay: Duration,

    /// Period of the liveness check
    pub heartbeat_interval: Duration,

    /// Silence after which the device is considered offline
    pub offline_threshold: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(5000),
            pacing_delay: Duration::from_millis(200),
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            offline_threshold: DEFAULT_OFFLINE_THRESHOLD,
        }
    }
}

impl SyncOptions {
    /// Reject timer periods the runtime cannot tick at
    pub fn validate(&self) -> Result<(), ClockError> {
        for (name, period) in [
            ("poll_interval", self.poll_interval),
            ("heartbeat_interval", self.heartbeat_interval),
            ("offline_threshold", self.offline_threshold),
        ] {
            if period.is_zero() {
                return Err(ClockError::ConfigError(format!("{} must be non-zero", name)));
            }
        }
        Ok(())
    }
}

/// How a call to [`PollingOrchestrator::run_cycle`] ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Every resource was fetched
    Completed,
    /// Another cycle was still in flight
    Skipped,
    /// A fetch failed; the device was marked offline
    Failed,
}

/// Clears the `fetching` flag on every exit path, including cancellation
struct FetchGuard<'a>(&'a AtomicBool);

impl<'a> FetchGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FetchGuard(flag))
    }
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owns the cached device state and keeps it in sync
pub struct PollingOrchestrator<F: ResourceFetcher = HttpClient> {
    fetcher: Arc<F>,
    events: Arc<EventBus>,
    options: SyncOptions,
    heartbeat: HeartbeatMonitor,
    state: RwLock<DeviceState>,
    last_success: Mutex<Option<Instant>>,
    fetching: AtomicBool,
    online: AtomicBool,
}

impl<F: ResourceFetcher> PollingOrchestrator<F> {
    /// Create an idle orchestrator; nothing is fetched until a cycle runs
    pub fn new(fetcher: Arc<F>, events: Arc<EventBus>, options: SyncOptions) -> Self {
        let heartbeat = HeartbeatMonitor::new(options.offline_threshold);
        Self {
            fetcher,
            events,
            options,
            heartbeat,
            state: RwLock::new(DeviceState::default()),
            last_success: Mutex::new(None),
            fetching: AtomicBool::new(false),
            online: AtomicBool::new(false),
        }
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Clone of the full cached state
    pub fn snapshot(&self) -> DeviceState {
        self.state.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Cached configuration, if fetched
    pub fn config(&self) -> Option<ConfigMap> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.config.clone()
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }

    pub fn is_fetching(&self) -> bool {
        self.fetching.load(Ordering::Acquire)
    }

    pub fn last_success(&self) -> Option<Instant> {
        *self.last_success.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ================================ POLLING ==================================== //

    /// Run one poll cycle unless one is already in flight
    ///
    /// Fetch failures are logged and turned into an offline transition; they
    /// are never returned to the caller.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let Some(_guard) = FetchGuard::try_acquire(&self.fetching) else {
            debug!("Poll cycle still in flight, skipping...");
            return CycleOutcome::Skipped;
        };

        let started = Instant::now();
        match self.fetch_all().await {
            Ok(()) => {
                debug!("Poll cycle completed in {:?}", started.elapsed());
                CycleOutcome::Completed
            }
            Err((resource, e)) => {
                error!("Poll cycle failed fetching {}: {}", resource, e);
                self.go_offline();
                CycleOutcome::Failed
            }
        }
    }

    async fn fetch_all(&self) -> Result<(), (Resource, ClockError)> {
        for (i, resource) in Resource::CYCLE.into_iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.options.pacing_delay).await;
            }
            self.fetch_resource(resource)
                .await
                .map_err(|e| (resource, e))?;
        }
        Ok(())
    }

    async fn fetch_resource(&self, resource: Resource) -> Result<(), ClockError> {
        let body = self.fetcher.get(resource.path(), &[]).await?;

        let event = {
            let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
            state.apply(resource, body)?
        };

        self.events.emit(&event);
        self.record_success();
        Ok(())
    }

    fn record_success(&self) {
        *self.last_success.lock().unwrap_or_else(|e| e.into_inner()) = Some(Instant::now());
        if !self.online.swap(true, Ordering::AcqRel) {
            info!("Device is online");
        }
    }

    /// Clear all snapshots and announce that the device is offline
    fn go_offline(&self) {
        self.state
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        *self.last_success.lock().unwrap_or_else(|e| e.into_inner()) = None;

        if self.online.swap(false, Ordering::AcqRel) {
            info!("Device went offline");
        }
        self.events.emit(&DeviceEvent::Offline);
    }

    /// Re-evaluate liveness now
    ///
    /// Triggers the offline transition when the device was online and has
    /// been silent for longer than the threshold. Returns the judgement.
    pub fn check_heartbeat(&self) -> bool {
        let alive = self.heartbeat.is_online(Instant::now(), self.last_success());
        if !alive && self.is_online() {
            warn!(
                "No successful update within {:?}, marking device offline",
                self.heartbeat.threshold()
            );
            self.go_offline();
        }
        alive
    }

    // =============================== MUTATIONS =================================== //

    /// Send a partial config to `/set` and return the device's answer untouched
    ///
    /// The cache is not modified; see [`Self::apply_config_result`].
    pub async fn set_config(
        &self,
        partial: &BTreeMap<String, Value>,
    ) -> Result<ConfigSetResult, ClockError> {
        info!("Setting config keys: {:?}", partial.keys().collect::<Vec<_>>());
        let body = self.fetcher.get(SET_PATH, &config_query(partial)).await?;
        let result: ConfigSetResult = serde_json::from_value(body)?;
        warn_if_rejected(&result);
        Ok(result)
    }

    /// Same as [`Self::set_config`] but sends the keys as a JSON body
    pub async fn set_config_json(
        &self,
        partial: &BTreeMap<String, Value>,
    ) -> Result<ConfigSetResult, ClockError> {
        info!("Setting config keys (json): {:?}", partial.keys().collect::<Vec<_>>());
        let payload = Value::Object(partial.clone().into_iter().collect());
        let body = self.fetcher.post(SET_PATH, &payload).await?;
        let result: ConfigSetResult = serde_json::from_value(body)?;
        warn_if_rejected(&result);
        Ok(result)
    }

    /// Merge a `/set` result into the cached config
    ///
    /// Emits a config event when anything changed. Returns the number of
    /// entries updated.
    pub fn apply_config_result(&self, result: &ConfigSetResult) -> usize {
        let updated = {
            let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
            match state.config.as_mut() {
                Some(config) => {
                    let applied = reconcile_config(config, result);
                    (applied > 0).then(|| (applied, config.clone()))
                }
                None => {
                    warn!("No cached config to reconcile against");
                    None
                }
            }
        };

        match updated {
            Some((applied, config)) => {
                self.events.emit(&DeviceEvent::Config(config));
                applied
            }
            None => 0,
        }
    }

    /// [`Self::set_config`] followed by [`Self::apply_config_result`]
    pub async fn set_config_and_apply(
        &self,
        partial: &BTreeMap<String, Value>,
    ) -> Result<ConfigSetResult, ClockError> {
        let result = self.set_config(partial).await?;
        self.apply_config_result(&result);
        Ok(result)
    }

    pub async fn reboot(&self) -> Result<Value, ClockError> {
        info!("Requesting device reboot");
        self.fetcher.get(REBOOT_PATH, &[]).await
    }

    pub async fn trigger_ota(&self, url: &str) -> Result<Value, ClockError> {
        info!("Triggering OTA from {}", url);
        self.fetcher.get(TRIGGER_OTA_PATH, &trigger_ota_query(url)).await
    }

    /// Ask the device to boot from its other app partition
    pub async fn switch_ota(&self) -> Result<Value, ClockError> {
        info!("Requesting OTA partition switch");
        self.fetcher.get(SWITCH_OTA_PATH, &[]).await
    }

    /// Fetch the animation catalogue; not cached and not part of a cycle
    pub async fn fetch_animations(&self) -> Result<Animations, ClockError> {
        let body = self.fetcher.get(ANIMATIONS_PATH, &[]).await?;
        Ok(serde_json::from_value(body)?)
    }
}

fn warn_if_rejected(result: &ConfigSetResult) {
    if !result.success {
        warn!(
            "Device rejected config change: {}",
            result.message.as_deref().unwrap_or("no message")
        );
    }
}

impl<F: ResourceFetcher + 'static> PollingOrchestrator<F> {
    /// Run an immediate cycle, then keep polling and checking liveness
    ///
    /// Both timers live until the returned handle is shut down or dropped.
    pub fn start(self: Arc<Self>) -> SyncHandle {
        let (shutdown_tx, _) = broadcast::channel(1);

        let poller_handle = {
            let orchestrator = self.clone();
            let options = poller::Options {
                interval: self.options.poll_interval,
            };
            let mut shutdown_rx = shutdown_tx.subscribe();
            tokio::spawn(async move {
                poller::run(
                    &options,
                    orchestrator.as_ref(),
                    Box::pin(async move {
                        let _ = shutdown_rx.recv().await;
                    }),
                )
                .await;
            })
        };

        let heartbeat_handle = {
            let orchestrator = self.clone();
            let options = heartbeat::Options {
                interval: self.options.heartbeat_interval,
            };
            let mut shutdown_rx = shutdown_tx.subscribe();
            tokio::spawn(async move {
                heartbeat::run(
                    &options,
                    orchestrator.as_ref(),
                    Box::pin(async move {
                        let _ = shutdown_rx.recv().await;
                    }),
                )
                .await;
            })
        };

        SyncHandle {
            shutdown_tx,
            poller_handle: Some(poller_handle),
            heartbeat_handle: Some(heartbeat_handle),
        }
    }
}

/// Running poll and heartbeat timers
pub struct SyncHandle {
    shutdown_tx: broadcast::Sender<()>,
    poller_handle: Option<JoinHandle<()>>,
    heartbeat_handle: Option<JoinHandle<()>>,
}

impl SyncHandle {
    /// Stop both timers and wait for their tasks to finish
    pub async fn shutdown(mut self) -> Result<(), ClockError> {
        let _ = self.shutdown_tx.send(());

        if let Some(handle) = self.poller_handle.take() {
            handle.await.map_err(|e| ClockError::ShutdownError(e.to_string()))?;
        }
        if let Some(handle) = self.heartbeat_handle.take() {
            handle.await.map_err(|e| ClockError::ShutdownError(e.to_string()))?;
        }
        Ok(())
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
    }
}
