//! In-memory settings document.
//!
//! Only the `plugins` key is interpreted. Every other top-level key is opaque
//! and must survive a read → merge → write cycle exactly as it was read.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use super::plugin_id::PluginId;

/// Top-level key holding plugin activations.
pub const PLUGINS_KEY: &str = "plugins";

/// Version tag written for every activation.
pub const LATEST_VERSION_TAG: &str = "latest";

/// Why a JSON value cannot be used as settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("expected a JSON object at the top level, found {0}")]
    NotAnObject(&'static str),
    #[error("expected `plugins` to be a JSON object, found {0}")]
    PluginsNotAnObject(&'static str),
}

/// A settings document: a JSON object in insertion key order.
///
/// `plugins`, when present, is always an object. Equality ignores key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Config(Map<String, Value>);

impl Config {
    /// Settings with an empty `plugins` mapping and nothing else.
    pub fn with_empty_plugins() -> Self {
        let mut map = Map::new();
        map.insert(PLUGINS_KEY.to_string(), Value::Object(Map::new()));
        Self(map)
    }

    /// Accept any JSON object whose `plugins` entry, if present, is an object.
    pub fn try_from_value(value: Value) -> Result<Self, ShapeError> {
        let map = match value {
            Value::Object(map) => map,
            other => return Err(ShapeError::NotAnObject(json_kind(&other))),
        };
        match map.get(PLUGINS_KEY) {
            None | Some(Value::Object(_)) => Ok(Self(map)),
            Some(other) => Err(ShapeError::PluginsNotAnObject(json_kind(other))),
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub(crate) fn as_map_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// The `plugins` mapping, if present and an object.
    pub fn plugins(&self) -> Option<&Map<String, Value>> {
        self.0.get(PLUGINS_KEY).and_then(Value::as_object)
    }

    /// Version tag recorded for `id`, if it is a string.
    pub fn plugin_version(&self, id: &PluginId) -> Option<&str> {
        self.plugins()?.get(id.as_str())?.as_str()
    }
}

impl From<Config> for Value {
    fn from(config: Config) -> Self {
        config.into_value()
    }
}

/// Human-readable name of a JSON value's type, for error messages.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn only_objects_are_configs() {
        assert!(Config::try_from_value(json!({"a": 1})).is_ok());
        let rejected = Config::try_from_value(json!([1, 2])).unwrap_err();
        assert_eq!(rejected, ShapeError::NotAnObject("an array"));
    }

    #[test]
    fn non_object_plugins_is_rejected_not_dropped() {
        let rejected = Config::try_from_value(json!({"plugins": ["keep-me"]})).unwrap_err();
        assert_eq!(rejected, ShapeError::PluginsNotAnObject("an array"));
        assert!(Config::try_from_value(json!({"plugins": null})).is_err());
        assert!(Config::try_from_value(json!({"plugins": {}})).is_ok());
    }

    #[test]
    fn equality_ignores_key_order() {
        let a = Config::try_from_value(json!({"a": 1, "b": 2})).expect("object");
        let b = Config::try_from_value(json!({"b": 2, "a": 1})).expect("object");
        assert_eq!(a, b);
    }

    #[test]
    fn plugin_version_reads_string_tags() {
        let config = Config::try_from_value(json!({
            "plugins": {"molcajete/git": "latest", "molcajete/odd": 3}
        }))
        .expect("object");
        let git = PluginId::parse("git").expect("id");
        let odd = PluginId::parse("odd").expect("id");
        assert_eq!(config.plugin_version(&git), Some("latest"));
        assert_eq!(config.plugin_version(&odd), None);
    }
}
