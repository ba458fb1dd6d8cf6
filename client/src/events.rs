//! State-change events
//!
//! The orchestrator publishes a [`DeviceEvent`] after every snapshot update
//! and when the device goes offline. Observers (a renderer, the CLI) hook in
//! through the [`EventBus`], which holds at most one handler per
//! [`EventKind`]. The set of kinds is closed; names outside it are rejected
//! when registering, not when emitting.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock};

use clock_models::{ConfigMap, DeviceStatus, LedsState, OtaStatus, TasksState};
use tracing::debug;

use crate::errors::ClockError;

/// Kinds of events an observer can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Status,
    Config,
    Leds,
    Tasks,
    Ota,
    Offline,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::Status,
        EventKind::Config,
        EventKind::Leds,
        EventKind::Tasks,
        EventKind::Ota,
        EventKind::Offline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Status => "status",
            EventKind::Config => "config",
            EventKind::Leds => "leds",
            EventKind::Tasks => "tasks",
            EventKind::Ota => "ota",
            EventKind::Offline => "offline",
        }
    }

    /// Handler-style name, as used by the web front-end (`onStatusChange`)
    pub fn handler_name(&self) -> &'static str {
        match self {
            EventKind::Status => "onStatusChange",
            EventKind::Config => "onConfigChange",
            EventKind::Leds => "onLedsChange",
            EventKind::Tasks => "onTasksChange",
            EventKind::Ota => "onOtaStatusChange",
            EventKind::Offline => "onOffline",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = ClockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s || kind.handler_name() == s)
            .ok_or_else(|| ClockError::UnknownEvent(s.to_string()))
    }
}

/// An event carrying the new snapshot
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    Status(DeviceStatus),
    Config(ConfigMap),
    Leds(LedsState),
    Tasks(TasksState),
    Ota(OtaStatus),
    /// The device stopped answering; all snapshots were cleared
    Offline,
}

impl DeviceEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            DeviceEvent::Status(_) => EventKind::Status,
            DeviceEvent::Config(_) => EventKind::Config,
            DeviceEvent::Leds(_) => EventKind::Leds,
            DeviceEvent::Tasks(_) => EventKind::Tasks,
            DeviceEvent::Ota(_) => EventKind::Ota,
            DeviceEvent::Offline => EventKind::Offline,
        }
    }
}

/// Event handler callback
pub type EventHandler = Arc<dyn Fn(&DeviceEvent) + Send + Sync>;

/// Single-subscriber-per-kind callback registry
#[derive(Default)]
pub struct EventBus {
    handlers: RwLock<HashMap<EventKind, EventHandler>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler by name, replacing any previous one
    pub fn register<H>(&self, name: &str, handler: H) -> Result<(), ClockError>
    where
        H: Fn(&DeviceEvent) + Send + Sync + 'static,
    {
        let kind = name.parse::<EventKind>()?;
        self.register_kind(kind, handler);
        Ok(())
    }

    /// Register a handler for a kind, replacing any previous one
    pub fn register_kind<H>(&self, kind: EventKind, handler: H)
    where
        H: Fn(&DeviceEvent) + Send + Sync + 'static,
    {
        let mut handlers = self.handlers.write().unwrap_or_else(|e| e.into_inner());
        if handlers.insert(kind, Arc::new(handler)).is_some() {
            debug!("Replaced handler for {} events", kind);
        }
    }

    /// Remove the handler registered under `name`
    ///
    /// Returns whether a handler was present.
    pub fn unregister(&self, name: &str) -> Result<bool, ClockError> {
        let kind = name.parse::<EventKind>()?;
        Ok(self.unregister_kind(kind))
    }

    pub fn unregister_kind(&self, kind: EventKind) -> bool {
        let mut handlers = self.handlers.write().unwrap_or_else(|e| e.into_inner());
        handlers.remove(&kind).is_some()
    }

    pub fn is_registered(&self, kind: EventKind) -> bool {
        let handlers = self.handlers.read().unwrap_or_else(|e| e.into_inner());
        handlers.contains_key(&kind)
    }

    /// Invoke the handler for the event's kind, if any
    pub fn emit(&self, event: &DeviceEvent) {
        // clone out so a handler may (un)register without deadlocking
        let handler = {
            let handlers = self.handlers.read().unwrap_or_else(|e| e.into_inner());
            handlers.get(&event.kind()).cloned()
        };

        if let Some(handler) = handler {
            handler(event);
        }
    }
}
