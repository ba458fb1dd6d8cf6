//! Clock API endpoints

use std::collections::BTreeMap;

use serde_json::Value;

pub const STATUS_PATH: &str = "/status";
pub const CONFIG_PATH: &str = "/config";
pub const LEDS_PATH: &str = "/leds";
pub const TASKS_PATH: &str = "/tasks";
pub const OTA_PATH: &str = "/ota";
pub const ANIMATIONS_PATH: &str = "/animations";
pub const SET_PATH: &str = "/set";
pub const REBOOT_PATH: &str = "/reboot";
pub const TRIGGER_OTA_PATH: &str = "/triggerOta";
pub const SWITCH_OTA_PATH: &str = "/switchOta";

/// Turn a partial config into `/set` query pairs
///
/// Strings are sent verbatim, every other value in its JSON text form
/// (`80`, `true`, `[1,2]`). Percent-encoding happens when the URL is built.
pub fn config_query(partial: &BTreeMap<String, Value>) -> Vec<(String, String)> {
    partial
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), value)
        })
        .collect()
}

/// Query pairs for `/triggerOta`
pub fn trigger_ota_query(url: &str) -> Vec<(String, String)> {
    vec![("url".to_string(), url.to_string())]
}
