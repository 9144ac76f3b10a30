//! Settings load with shape validation.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use jsonschema::validator_for;
use serde_json::Value;
use tracing::debug;

use crate::core::types::{Config, json_kind};
use crate::error::{Operation, Result, SetupError};

const SETTINGS_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../schemas/settings/v1.schema.json"
));

/// Load settings from `path`.
///
/// Returns `Ok(None)` when the file does not exist. Never modifies the file
/// or its directory.
pub fn read_config(path: &Path) -> Result<Option<Config>> {
    debug!(path = %path.display(), "reading settings");
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "settings file absent");
            return Ok(None);
        }
        Err(err) => return Err(SetupError::from_io(path, Operation::Read, err)),
    };
    let contents = String::from_utf8(bytes).map_err(|err| {
        SetupError::malformed(
            path,
            format!(
                "not valid UTF-8 (byte offset {})",
                err.utf8_error().valid_up_to()
            ),
        )
    })?;
    let config = parse_config(path, &contents)?;
    debug!(
        path = %path.display(),
        keys = config.as_map().len(),
        plugins = config.plugins().map_or(0, |plugins| plugins.len()),
        "settings loaded"
    );
    Ok(Some(config))
}

/// Parse settings text. `path` is only used in error messages.
pub fn parse_config(path: &Path, contents: &str) -> Result<Config> {
    let value: Value = serde_json::from_str(contents)
        .map_err(|err| SetupError::malformed(path, format!("invalid JSON: {err}")))?;
    if !value.is_object() {
        return Err(SetupError::malformed(
            path,
            format!(
                "expected a JSON object at the top level, found {}",
                json_kind(&value)
            ),
        ));
    }
    validate_schema(path, &value)?;
    Config::try_from_value(value).map_err(|err| SetupError::malformed(path, err.to_string()))
}

fn validate_schema(path: &Path, settings: &Value) -> Result<()> {
    let schema: Value =
        serde_json::from_str(SETTINGS_SCHEMA).map_err(|err| SetupError::SerializationFailure {
            detail: format!("embedded settings schema: {err}"),
        })?;
    let compiled = validator_for(&schema).map_err(|err| SetupError::SerializationFailure {
        detail: format!("embedded settings schema: {err}"),
    })?;
    let messages: Vec<String> = compiled
        .iter_errors(settings)
        .map(|err| err.to_string())
        .collect();
    if !messages.is_empty() {
        return Err(SetupError::malformed(
            path,
            format!("schema validation failed: {}", messages.join("; ")),
        ));
    }
    Ok(())
}
