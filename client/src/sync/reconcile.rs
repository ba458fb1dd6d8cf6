//! Merging `/set` responses into the cached config

use clock_models::{ConfigEntry, ConfigMap, ConfigSetResult, ConfigValue, EnumValue};
use serde_json::Value;
use tracing::{debug, warn};

/// Apply a mutation result to the cached config
///
/// Every key named in `result` overwrites the cached entry's value and marks
/// it touched. Keys the cache does not hold are skipped, never inserted.
/// Applying the same result again leaves the map unchanged.
///
/// Returns the number of entries updated.
pub fn reconcile_config(config: &mut ConfigMap, result: &ConfigSetResult) -> usize {
    if !result.success {
        warn!(
            "Applying keys from an unsuccessful set: {}",
            result.message.as_deref().unwrap_or("no message")
        );
    }

    let mut applied = 0;
    for (key, set) in &result.keys {
        let Some(entry) = config.get_mut(key) else {
            warn!("Ignoring set result for unknown config key '{}'", key);
            continue;
        };

        entry.value = merge_value(key, entry, &set.value);
        entry.touched = true;
        applied += 1;
        debug!("Reconciled config key '{}'", key);
    }

    applied
}

fn merge_value(key: &str, entry: &ConfigEntry, new: &Value) -> ConfigValue {
    match (&entry.value, new) {
        // the device only echoes the selected name of an enum
        (ConfigValue::Enum(current), Value::String(selected)) => {
            if !current.allows(selected) {
                warn!("Value '{}' for '{}' is not one of {:?}", selected, key, current.values);
            }
            ConfigValue::Enum(EnumValue {
                value: selected.clone(),
                values: current.values.clone(),
            })
        }
        (ConfigValue::Enum(_), other) => ConfigValue::from(other.clone()),
        // the firmware stringifies values in its response ("80", "true")
        (ConfigValue::Scalar(current), Value::String(text)) if !current.is_string() => {
            match serde_json::from_str::<Value>(text) {
                Ok(parsed) if same_type(current, &parsed) => ConfigValue::Scalar(parsed),
                _ => ConfigValue::Scalar(new.clone()),
            }
        }
        (ConfigValue::Scalar(_), other) => ConfigValue::Scalar(other.clone()),
    }
}

fn same_type(a: &Value, b: &Value) -> bool {
    std::mem::discriminant(a) == std::mem::discriminant(b)
}
