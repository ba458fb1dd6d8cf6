//! Console reporting of state changes

use clock_models::{ConfigValue, OtaStatus};
use colored::Colorize;

use crate::events::{DeviceEvent, EventBus, EventKind};

/// Print a one-line summary for every event kind
pub fn register_console_reporters(events: &EventBus) {
    for kind in EventKind::ALL {
        events.register_kind(kind, |event| println!("{}", summarize(event)));
    }
}

/// One-line human summary of an event
pub fn summarize(event: &DeviceEvent) -> String {
    let tag = format!("[{}]", event.kind()).cyan();
    match event {
        DeviceEvent::Status(status) => format!("{} {}", tag, status.0),
        DeviceEvent::Config(config) => {
            let touched: Vec<_> = config
                .iter()
                .filter(|(_, entry)| entry.touched)
                .map(|(key, entry)| format!("{}={}", key, display_value(&entry.value)))
                .collect();
            if touched.is_empty() {
                format!("{} {} keys", tag, config.len())
            } else {
                format!("{} {} keys, changed: {}", tag, config.len(), touched.join(", "))
            }
        }
        DeviceEvent::Leds(leds) => format!("{} {}", tag, leds.0),
        DeviceEvent::Tasks(tasks) => format!("{} {}", tag, tasks.0),
        DeviceEvent::Ota(ota) => format!("{} {}", tag, summarize_ota(ota)),
        DeviceEvent::Offline => format!("{} {}", tag, "device unreachable".red().bold()),
    }
}

fn summarize_ota(ota: &OtaStatus) -> String {
    let version = ota
        .current_app
        .as_ref()
        .and_then(|app| app.get("version"))
        .and_then(|v| v.as_str())
        .unwrap_or("?");

    if ota.is_in_progress {
        let message = ota.ota_message.as_deref().unwrap_or("");
        format!("running {} | updating {:.0}% {}", version, ota.percentage, message)
            .yellow()
            .to_string()
    } else {
        format!("running {}", version)
    }
}

fn display_value(value: &ConfigValue) -> String {
    match value {
        ConfigValue::Enum(e) => e.value.clone(),
        ConfigValue::Scalar(v) => v.to_string(),
    }
}
