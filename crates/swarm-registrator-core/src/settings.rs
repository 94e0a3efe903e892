//! Application settings and the merge of base configuration with runtime facts.
//!
//! Base settings are stored by the deployment tooling as a JSON object. Only
//! two fields are interpreted here, and both are read leniently: a value that
//! is not a usable port never makes the document unreadable. Every field,
//! including the interpreted ones, is written back exactly as it was read.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key of the configured HTTP target port.
pub const HTTP_PORT_FIELD: &str = "http_port";

/// Key of the published port derived from the orchestrator.
pub const SWARM_PORT_FIELD: &str = "swarm_port";

/// What the `http_port` field of the base settings says.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HttpPortSetting<'a> {
    /// Absent or `null`.
    Unset,
    /// A port number, given as an integer or a numeric string.
    Port(u16),
    /// Present but not a port; kept as is and otherwise ignored.
    Invalid(&'a Value),
}

/// Free-form service configuration.
///
/// Serializes as a single flat JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppSettings {
    fields: Map<String, Value>,
}

impl AppSettings {
    /// Empty settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings with only `http_port` configured.
    #[must_use]
    pub fn with_http_port(port: u16) -> Self {
        let mut settings = Self::new();
        settings.insert(HTTP_PORT_FIELD, Value::from(port));
        settings
    }

    /// Parse settings from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not a JSON object.
    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Serialize settings to a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if a value cannot be serialized.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Interpret the `http_port` field.
    #[must_use]
    pub fn http_port_setting(&self) -> HttpPortSetting<'_> {
        match self.fields.get(HTTP_PORT_FIELD) {
            None | Some(Value::Null) => HttpPortSetting::Unset,
            Some(value) => {
                port_from_value(value).map_or(HttpPortSetting::Invalid(value), HttpPortSetting::Port)
            }
        }
    }

    /// The configured HTTP target port, if `http_port` holds a usable one.
    #[must_use]
    pub fn http_port(&self) -> Option<u16> {
        match self.http_port_setting() {
            HttpPortSetting::Port(port) => Some(port),
            HttpPortSetting::Unset | HttpPortSetting::Invalid(_) => None,
        }
    }

    /// The `swarm_port` field, if it is a string.
    #[must_use]
    pub fn swarm_port(&self) -> Option<&str> {
        self.fields.get(SWARM_PORT_FIELD).and_then(Value::as_str)
    }

    /// Look up any field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Set a field, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    /// Check if no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn port_from_value(value: &Value) -> Option<u16> {
    match value {
        Value::Number(number) => number.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Overlay derived runtime facts onto the base settings.
///
/// When `http_published_port` is present, `swarm_port` is set to its decimal
/// form, replacing whatever the base held under that key. Otherwise the base
/// is returned unchanged.
#[must_use]
pub fn merge(mut base: AppSettings, http_published_port: Option<u16>) -> AppSettings {
    if let Some(port) = http_published_port {
        base.insert(SWARM_PORT_FIELD, Value::String(port.to_string()));
    }
    base
}
