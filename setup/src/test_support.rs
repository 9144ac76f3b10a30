//! Test-only helpers for settings files in temporary directories.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::TempDir;

use crate::io::paths::{is_temp_sibling, parent_dir, settings_path_in};

/// Temporary home directory with a settings path under it.
///
/// The settings directory is not created up front, so writes exercise
/// directory creation.
pub struct TestHome {
    dir: TempDir,
}

impl TestHome {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn settings_path(&self) -> PathBuf {
        settings_path_in(self.dir.path())
    }

    /// Write raw `contents` to the settings path, creating its directory.
    pub fn seed_raw(&self, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.settings_path();
        fs::create_dir_all(parent_dir(&path))?;
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Write `value` as pretty JSON to the settings path.
    pub fn seed_json(&self, value: &Value) -> std::io::Result<PathBuf> {
        let contents = serde_json::to_string_pretty(value)?;
        self.seed_raw(&contents)
    }

    pub fn read_raw(&self) -> std::io::Result<String> {
        fs::read_to_string(self.settings_path())
    }

    pub fn read_json(&self) -> std::io::Result<Value> {
        let contents = self.read_raw()?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Leftover temporary siblings of the settings file.
    pub fn stray_temp_files(&self) -> std::io::Result<Vec<PathBuf>> {
        let target = self.settings_path();
        let dir = parent_dir(&target);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut stray = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if is_temp_sibling(&target, &path) {
                stray.push(path);
            }
        }
        Ok(stray)
    }
}
