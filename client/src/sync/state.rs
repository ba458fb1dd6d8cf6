//! Cached device state

use chrono::{DateTime, Utc};
use clock_models::{ConfigMap, DeviceStatus, LedsState, OtaStatus, TasksState};
use serde::Serialize;
use serde_json::Value;

use crate::errors::ClockError;
use crate::events::{DeviceEvent, EventKind};
use crate::http::device::{CONFIG_PATH, LEDS_PATH, OTA_PATH, STATUS_PATH, TASKS_PATH};

/// A resource fetched by every poll cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Status,
    Config,
    Leds,
    Tasks,
    Ota,
}

impl Resource {
    /// Fetch order of one poll cycle
    pub const CYCLE: [Resource; 5] = [
        Resource::Status,
        Resource::Config,
        Resource::Leds,
        Resource::Tasks,
        Resource::Ota,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Resource::Status => STATUS_PATH,
            Resource::Config => CONFIG_PATH,
            Resource::Leds => LEDS_PATH,
            Resource::Tasks => TASKS_PATH,
            Resource::Ota => OTA_PATH,
        }
    }

    pub fn event_kind(&self) -> EventKind {
        match self {
            Resource::Status => EventKind::Status,
            Resource::Config => EventKind::Config,
            Resource::Leds => EventKind::Leds,
            Resource::Tasks => EventKind::Tasks,
            Resource::Ota => EventKind::Ota,
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.event_kind().as_str())
    }
}

/// Last known snapshots of every tracked resource
///
/// Each snapshot is replaced wholesale by a successful poll; `None` means
/// "not fetched yet" or "cleared by an offline transition".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceState {
    pub status: Option<DeviceStatus>,
    pub config: Option<ConfigMap>,
    pub leds: Option<LedsState>,
    pub tasks: Option<TasksState>,
    pub ota: Option<OtaStatus>,

    /// Wall-clock time of the last snapshot update
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl DeviceState {
    /// Replace the snapshot of `resource` with the parsed `body`
    ///
    /// The body is parsed before anything is touched, so a malformed
    /// response leaves the previous snapshot in place.
    pub fn apply(&mut self, resource: Resource, body: Value) -> Result<DeviceEvent, ClockError> {
        let event = match resource {
            Resource::Status => {
                let status: DeviceStatus = serde_json::from_value(body)?;
                self.status = Some(status.clone());
                DeviceEvent::Status(status)
            }
            Resource::Config => {
                let config: ConfigMap = serde_json::from_value(body)?;
                self.config = Some(config.clone());
                DeviceEvent::Config(config)
            }
            Resource::Leds => {
                let leds: LedsState = serde_json::from_value(body)?;
                self.leds = Some(leds.clone());
                DeviceEvent::Leds(leds)
            }
            Resource::Tasks => {
                let tasks: TasksState = serde_json::from_value(body)?;
                self.tasks = Some(tasks.clone());
                DeviceEvent::Tasks(tasks)
            }
            Resource::Ota => {
                let ota: OtaStatus = serde_json::from_value(body)?;
                self.ota = Some(ota.clone());
                DeviceEvent::Ota(ota)
            }
        };

        self.last_synced_at = Some(Utc::now());
        Ok(event)
    }

    /// Drop every snapshot
    pub fn clear(&mut self) {
        *self = DeviceState::default();
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.config.is_none()
            && self.leds.is_none()
            && self.tasks.is_none()
            && self.ota.is_none()
    }
}
