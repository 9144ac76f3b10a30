//! Merge requested plugin activations into existing settings.

use serde_json::{Map, Value};

use super::plugin_id::{PluginId, PluginSelection};
use super::types::{Config, LATEST_VERSION_TAG, PLUGINS_KEY};

/// Which requested plugins were new and which were already configured.
///
/// Both lists follow the order of the selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub added: Vec<PluginId>,
    pub refreshed: Vec<PluginId>,
}

/// Merge `requested` into `existing` (or into empty settings when absent).
///
/// Non-`plugins` keys are carried over untouched. Each requested plugin is set
/// to [`LATEST_VERSION_TAG`]. An existing entry for the same plugin, under any
/// spelling [`PluginId::matches_key`] accepts, is replaced in place by the
/// canonical key, so merging the same selection twice is a no-op.
pub fn merge(existing: Option<&Config>, requested: &PluginSelection) -> Config {
    merge_with_summary(existing, requested).0
}

pub fn merge_with_summary(
    existing: Option<&Config>,
    requested: &PluginSelection,
) -> (Config, MergeSummary) {
    if requested.is_empty() {
        let unchanged = existing.cloned().unwrap_or_else(Config::with_empty_plugins);
        return (unchanged, MergeSummary::default());
    }

    let mut merged = existing.cloned().unwrap_or_default();
    // Config guarantees `plugins` is an object whenever it is present.
    let current = match merged.as_map_mut().get_mut(PLUGINS_KEY).map(std::mem::take) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };

    let mut plugins = Map::new();
    let mut seen: Vec<&PluginId> = Vec::new();
    for (key, value) in current {
        match requested.iter().find(|id| id.matches_key(&key)) {
            Some(id) => {
                if !seen.contains(&id) {
                    seen.push(id);
                }
                plugins.insert(id.as_str().to_string(), latest());
            }
            None => {
                plugins.insert(key, value);
            }
        }
    }

    let mut summary = MergeSummary::default();
    for id in requested {
        if seen.contains(&id) {
            summary.refreshed.push(id.clone());
        } else {
            plugins.insert(id.as_str().to_string(), latest());
            summary.added.push(id.clone());
        }
    }

    // Re-inserting an existing key keeps its position in the parent map.
    merged
        .as_map_mut()
        .insert(PLUGINS_KEY.to_string(), Value::Object(plugins));
    (merged, summary)
}

fn latest() -> Value {
    Value::String(LATEST_VERSION_TAG.to_string())
}
