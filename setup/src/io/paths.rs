//! Settings file location and sibling paths.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use directories::BaseDirs;

use crate::error::{Result, SetupError};

/// Directory under `$HOME` owned by the host application.
pub const HOST_DIR: &str = ".claude";
/// Settings file name inside [`HOST_DIR`].
pub const SETTINGS_FILE: &str = "settings.json";

/// Default settings path for the current user (`~/.claude/settings.json`).
pub fn default_settings_path() -> Result<PathBuf> {
    let dirs = BaseDirs::new().ok_or(SetupError::NoHomeDirectory)?;
    Ok(settings_path_in(dirs.home_dir()))
}

/// Settings path relative to an explicit home directory.
pub fn settings_path_in(home: &Path) -> PathBuf {
    home.join(HOST_DIR).join(SETTINGS_FILE)
}

/// Directory that holds `path`. A bare file name resolves to `.`.
pub fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Hidden, process-unique temporary sibling of `path`.
///
/// Lives in the same directory so the final rename never crosses filesystems.
pub fn temp_sibling(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| SETTINGS_FILE.to_string());
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    parent_dir(path).join(format!(
        ".{file_name}.tmp.{}.{nanos}",
        std::process::id()
    ))
}

/// True if `candidate` looks like a temporary sibling of `path`.
pub fn is_temp_sibling(path: &Path, candidate: &Path) -> bool {
    let (Some(name), Some(candidate_name)) = (path.file_name(), candidate.file_name()) else {
        return false;
    };
    let prefix = format!(".{}.tmp.", name.to_string_lossy());
    parent_dir(candidate) == parent_dir(path)
        && candidate_name.to_string_lossy().starts_with(&prefix)
}
