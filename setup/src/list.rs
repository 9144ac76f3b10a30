//! Read-only view of the plugins currently configured.

use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::core::plugin_id::NAMESPACE;
use crate::error::Result;
use crate::io::reader::read_config;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfiguredPlugin {
    pub id: String,
    pub version: String,
}

/// Plugins in our namespace recorded in the settings at `settings_path`,
/// in file order. A missing file has none.
pub fn configured_plugins(settings_path: &Path) -> Result<Vec<ConfiguredPlugin>> {
    let Some(config) = read_config(settings_path)? else {
        return Ok(Vec::new());
    };
    let prefix = format!("{NAMESPACE}/");
    let plugins = config
        .plugins()
        .into_iter()
        .flatten()
        .filter(|(id, _)| id.starts_with(&prefix))
        .map(|(id, version)| ConfiguredPlugin {
            id: id.clone(),
            version: match version {
                Value::String(tag) => tag.clone(),
                other => other.to_string(),
            },
        })
        .collect();
    Ok(plugins)
}
