//! API models

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Device identity and uptime record from `/status`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceStatus(pub Value);

/// LED state record from `/leds`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedsState(pub Value);

/// Task list record from `/tasks`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TasksState(pub Value);

/// Animation catalogue from `/animations`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Animations(pub Value);

/// Full configuration as returned by `/config`
pub type ConfigMap = BTreeMap<String, ConfigEntry>;

/// Enumerated config value with its allowed choices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumValue {
    pub value: String,
    pub values: Vec<String>,
}

impl EnumValue {
    /// Whether `candidate` is one of the allowed choices
    pub fn allows(&self, candidate: &str) -> bool {
        self.values.iter().any(|v| v == candidate)
    }
}

/// A config value: either an enum with choices or a plain JSON scalar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Enum(EnumValue),
    Scalar(Value),
}

impl ConfigValue {
    /// Short type name used when the device does not describe the entry
    pub fn type_name(&self) -> &'static str {
        match self {
            ConfigValue::Enum(_) => "enum",
            ConfigValue::Scalar(Value::Null) => "null",
            ConfigValue::Scalar(Value::Bool(_)) => "bool",
            ConfigValue::Scalar(Value::Number(_)) => "number",
            ConfigValue::Scalar(Value::String(_)) => "string",
            ConfigValue::Scalar(Value::Array(_)) => "array",
            ConfigValue::Scalar(Value::Object(_)) => "object",
        }
    }
}

impl From<Value> for ConfigValue {
    fn from(value: Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or(ConfigValue::Scalar(value))
    }
}

/// One configuration key as cached by the client
///
/// `touched` is client-side bookkeeping: it is set when a mutation response
/// has overwritten the value since the last full `/config` poll.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: ConfigValue,
    pub touched: bool,
}

impl ConfigEntry {
    pub fn new(kind: impl Into<String>, value: ConfigValue) -> Self {
        Self {
            kind: kind.into(),
            value,
            touched: false,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawConfigEntry {
    Described {
        #[serde(rename = "type")]
        kind: String,
        value: ConfigValue,
        #[serde(default)]
        touched: bool,
    },
    // firmware builds that stream `key: value` without a type wrapper
    Bare(ConfigValue),
}

impl<'de> Deserialize<'de> for ConfigEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match RawConfigEntry::deserialize(deserializer)? {
            RawConfigEntry::Described {
                kind,
                value,
                touched,
            } => ConfigEntry {
                kind,
                value,
                touched,
            },
            RawConfigEntry::Bare(value) => ConfigEntry::new(value.type_name(), value),
        })
    }
}

/// Partition metadata reported for the running and the inactive app
pub type AppDescription = BTreeMap<String, Value>;

/// OTA progress and partition info from `/ota`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtaStatus {
    #[serde(default)]
    pub success: bool,

    /// Progress percentage (0-100); `null` (NaN on the device) reads as 0
    #[serde(default, deserialize_with = "deserialize_percentage")]
    pub percentage: f64,

    #[serde(default)]
    pub is_in_progress: bool,

    #[serde(default)]
    pub is_constructed: bool,

    /// Bytes written so far
    #[serde(default)]
    pub progress: Option<u64>,

    /// Image size in bytes, when known
    #[serde(default)]
    pub total_size: Option<u64>,

    #[serde(default)]
    pub ota_message: Option<String>,

    #[serde(default)]
    pub current_app: Option<AppDescription>,

    #[serde(default)]
    pub other_app: Option<AppDescription>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn deserialize_percentage<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

/// Authoritative post-mutation value of one key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetKey {
    pub key: String,
    pub value: Value,
}

/// Response of `/set`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigSetResult {
    pub success: bool,

    #[serde(default, deserialize_with = "deserialize_set_keys")]
    pub keys: BTreeMap<String, SetKey>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSetKeys {
    Map(BTreeMap<String, SetKey>),
    List(Vec<SetKey>),
}

// The firmware emits `keys` as a list of `{key, value}`; accept the keyed form too.
fn deserialize_set_keys<'de, D>(deserializer: D) -> Result<BTreeMap<String, SetKey>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawSetKeys::deserialize(deserializer)? {
        RawSetKeys::Map(map) => map,
        RawSetKeys::List(list) => list.into_iter().map(|k| (k.key.clone(), k)).collect(),
    })
}
