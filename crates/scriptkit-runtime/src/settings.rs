use crate::error::{Result, RuntimeError};
use crate::storage::{json_type, KeyValueStore};
use serde_json::{json, Value};
use std::fmt;

/// Settings the advanced template keeps in script storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    Enabled,
    PanelVisible,
    PanelX,
    PanelY,
    WaitTimeoutMs,
    DebugLogging,
}

impl SettingKey {
    pub fn all() -> &'static [SettingKey] {
        &[
            SettingKey::Enabled,
            SettingKey::PanelVisible,
            SettingKey::PanelX,
            SettingKey::PanelY,
            SettingKey::WaitTimeoutMs,
            SettingKey::DebugLogging,
        ]
    }

    /// Storage key, spelled the way the template's `DEFAULTS` object does.
    pub fn as_str(self) -> &'static str {
        match self {
            SettingKey::Enabled => "enabled",
            SettingKey::PanelVisible => "panelVisible",
            SettingKey::PanelX => "panelX",
            SettingKey::PanelY => "panelY",
            SettingKey::WaitTimeoutMs => "waitTimeoutMs",
            SettingKey::DebugLogging => "debugLogging",
        }
    }

    pub fn default_value(self) -> Value {
        match self {
            SettingKey::Enabled => json!(true),
            SettingKey::PanelVisible => json!(true),
            SettingKey::PanelX => json!(20),
            SettingKey::PanelY => json!(20),
            SettingKey::WaitTimeoutMs => json!(10_000),
            SettingKey::DebugLogging => json!(false),
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SettingKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        SettingKey::all()
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown setting '{s}'"))
    }
}

/// Type name a key's values must have. Integer defaults only accept
/// integers, not any JSON number.
fn expected_type(default: &Value) -> &'static str {
    if default.is_i64() {
        "integer"
    } else {
        json_type(default)
    }
}

fn fits(value: &Value, default: &Value) -> bool {
    if default.is_i64() {
        value.is_i64()
    } else {
        json_type(value) == json_type(default)
    }
}

/// Typed accessor over a [`KeyValueStore`]: reads fall back to the key's
/// default when nothing (or a value of the wrong type) is stored.
pub struct Settings<'a, S: KeyValueStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: KeyValueStore + ?Sized> Settings<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn get(&self, key: SettingKey) -> Result<Value> {
        let default = key.default_value();
        match self.store.get(key.as_str())? {
            Some(v) if fits(&v, &default) => Ok(v),
            Some(v) => {
                tracing::warn!(
                    key = key.as_str(),
                    found = json_type(&v),
                    "stored setting has the wrong type; using default"
                );
                Ok(default)
            }
            None => Ok(default),
        }
    }

    pub fn get_i64(&self, key: SettingKey) -> Result<i64> {
        self.get(key)?
            .as_i64()
            .ok_or_else(|| type_error(key))
    }

    /// Store an override. The value must have the default's type; integer
    /// settings reject fractional numbers.
    pub fn set(&self, key: SettingKey, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        if !fits(&value, &key.default_value()) {
            return Err(type_error(key));
        }
        self.store.set(key.as_str(), value)
    }

    pub fn is_overridden(&self, key: SettingKey) -> Result<bool> {
        Ok(self.store.get(key.as_str())?.is_some())
    }

    /// Drop the override so reads return the default again.
    pub fn reset(&self, key: SettingKey) -> Result<()> {
        self.store.delete(key.as_str())
    }

    pub fn reset_all(&self) -> Result<()> {
        SettingKey::all().iter().try_for_each(|k| self.reset(*k))
    }
}

fn type_error(key: SettingKey) -> RuntimeError {
    RuntimeError::SettingType {
        key: key.as_str().to_string(),
        expected: expected_type(&key.default_value()),
    }
}
