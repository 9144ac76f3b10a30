//! Atomic settings write (self-checked render, temp sibling + rename).

use std::fs::{self, DirBuilder, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use super::paths::{parent_dir, temp_sibling};
use crate::core::types::Config;
use crate::error::{Operation, Result, SetupError};

/// Mode for directories created on the way to the settings file.
#[cfg(unix)]
const PRIVATE_DIR_MODE: u32 = 0o700;

/// Render, stage and commit `config` to `path`.
///
/// Either the rename commits and readers see the new content, or the file at
/// `path` is left exactly as it was.
pub fn write_config(path: &Path, config: &Config) -> Result<()> {
    debug!(path = %path.display(), "writing settings");
    let payload = render_config(config)?;
    ensure_parent_dir(path)?;
    StagedWrite::stage(path, &payload)?.commit()
}

/// Serialize `config` as 2-space-indented JSON with a trailing newline.
///
/// The output is parsed back and compared against `config` before it is
/// returned; a mismatch is a `SerializationFailure`.
pub fn render_config(config: &Config) -> Result<String> {
    let mut buf = serde_json::to_string_pretty(config.as_map()).map_err(|err| {
        SetupError::SerializationFailure {
            detail: err.to_string(),
        }
    })?;
    buf.push('\n');
    verify_round_trip(config, &buf)?;
    Ok(buf)
}

fn verify_round_trip(config: &Config, rendered: &str) -> Result<()> {
    let reparsed: Value =
        serde_json::from_str(rendered).map_err(|err| SetupError::SerializationFailure {
            detail: format!("rendered settings do not parse: {err}"),
        })?;
    if reparsed.as_object() != Some(config.as_map()) {
        return Err(SetupError::SerializationFailure {
            detail: "rendered settings differ from the merged settings".to_string(),
        });
    }
    Ok(())
}

/// Create the directory holding `path`, and any missing ancestors.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    let parent = parent_dir(path);
    if parent.is_dir() {
        return Ok(());
    }
    debug!(dir = %parent.display(), "creating settings directory");
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(PRIVATE_DIR_MODE);
    }
    match builder.create(parent) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::AlreadyExists && parent.is_dir() => Ok(()),
        Err(err) if err.kind() == ErrorKind::PermissionDenied => Err(SetupError::AccessDenied {
            path: parent.to_path_buf(),
            operation: Operation::CreateDirectory,
        }),
        Err(source) => Err(SetupError::DirectoryCreateFailure {
            path: parent.to_path_buf(),
            source,
        }),
    }
}

/// Fully written temporary sibling of a settings file, not yet renamed.
///
/// Dropping an uncommitted `StagedWrite` removes the temporary file and leaves
/// the target untouched.
#[derive(Debug)]
pub struct StagedWrite {
    target: PathBuf,
    temp: PathBuf,
    created: bool,
    committed: bool,
}

impl StagedWrite {
    /// Write `contents` to a fresh temporary sibling of `target` and flush it
    /// to disk. The parent directory must already exist.
    pub fn stage(target: &Path, contents: &str) -> Result<Self> {
        let staged = Self::stage_with(target, |file| file.write_all(contents.as_bytes()))?;
        debug!(temp = %staged.temp.display(), bytes = contents.len(), "staged settings");
        Ok(staged)
    }

    /// Like [`StagedWrite::stage`], with `fill` producing the temp file body.
    ///
    /// If anything fails after the temp file exists, it is removed before the
    /// error is returned.
    pub(crate) fn stage_with<F>(target: &Path, fill: F) -> Result<Self>
    where
        F: FnOnce(&mut File) -> std::io::Result<()>,
    {
        let mut staged = Self {
            target: target.to_path_buf(),
            temp: temp_sibling(target),
            created: false,
            committed: false,
        };
        staged.write_temp(fill)?;
        Ok(staged)
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp
    }

    pub fn target_path(&self) -> &Path {
        &self.target
    }

    /// Atomically rename the temporary file over the target.
    pub fn commit(mut self) -> Result<()> {
        fs::rename(&self.temp, &self.target)
            .map_err(|err| SetupError::from_io(&self.target, Operation::Replace, err))?;
        self.committed = true;
        debug!(path = %self.target.display(), "settings replaced");
        Ok(())
    }

    // Errors name the target; the temp file name means nothing to users.
    fn write_temp<F>(&mut self, fill: F) -> Result<()>
    where
        F: FnOnce(&mut File) -> std::io::Result<()>,
    {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.temp)
            .map_err(|err| SetupError::from_io(&self.target, Operation::Write, err))?;
        self.created = true;
        fill(&mut file).map_err(|err| SetupError::from_io(&self.target, Operation::Write, err))?;
        carry_over_mode(&self.target, &file)
            .map_err(|err| SetupError::from_io(&self.target, Operation::Write, err))?;
        file.sync_all()
            .map_err(|err| SetupError::from_io(&self.target, Operation::Write, err))?;
        Ok(())
    }
}

impl Drop for StagedWrite {
    fn drop(&mut self) {
        if self.committed || !self.created {
            return;
        }
        match fs::remove_file(&self.temp) {
            Ok(()) => debug!(temp = %self.temp.display(), "removed uncommitted temp file"),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => warn!(
                temp = %self.temp.display(),
                error = %err,
                "failed to remove temp settings file"
            ),
        }
    }
}

/// Give the replacement the same permission bits as the file it replaces.
#[cfg(unix)]
fn carry_over_mode(target: &Path, file: &File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    match fs::metadata(target) {
        Ok(meta) => {
            let mode = meta.permissions().mode() & 0o7777;
            file.set_permissions(fs::Permissions::from_mode(mode))
        }
        Err(_) => Ok(()),
    }
}

#[cfg(not(unix))]
fn carry_over_mode(_target: &Path, _file: &File) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind as SetupErrorKind;
    use crate::io::paths::is_temp_sibling;
    use crate::io::reader::read_config;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn config(value: Value) -> Config {
        Config::try_from_value(value).expect("object")
    }

    fn stray_temp_files(target: &Path) -> Vec<PathBuf> {
        fs::read_dir(parent_dir(target))
            .expect("read dir")
            .map(|entry| entry.expect("entry").path())
            .filter(|path| is_temp_sibling(target, path))
            .collect()
    }

    #[test]
    fn render_uses_two_space_indent_and_trailing_newline() {
        let rendered =
            render_config(&config(json!({"plugins": {"molcajete/git": "latest"}}))).expect("render");
        assert_eq!(
            rendered,
            "{\n  \"plugins\": {\n    \"molcajete/git\": \"latest\"\n  }\n}\n"
        );
    }

    #[test]
    fn render_keeps_insertion_order() {
        let rendered = render_config(&config(json!({"zeta": 1, "alpha": 2}))).expect("render");
        let zeta = rendered.find("zeta").expect("zeta");
        let alpha = rendered.find("alpha").expect("alpha");
        assert!(zeta < alpha);
    }

    #[test]
    fn write_then_read_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("settings.json");
        let written = config(json!({
            "other": [1, 2.5, "three", null, {"four": false}],
            "plugins": {"molcajete/git": "latest"}
        }));
        write_config(&path, &written).expect("write");
        let loaded = read_config(&path).expect("read").expect("present");
        assert_eq!(loaded, written);
        assert!(stray_temp_files(&path).is_empty());
    }

    #[test]
    fn write_creates_missing_directories() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("home/.claude/settings.json");
        write_config(&path, &Config::with_empty_plugins()).expect("write");
        assert!(path.is_file());
    }

    #[cfg(unix)]
    #[test]
    fn created_directories_are_private() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().expect("tempdir");
        let dir = temp.path().join(".claude");
        ensure_parent_dir(&dir.join("settings.json")).expect("mkdir");
        let mode = fs::metadata(&dir).expect("meta").permissions().mode() & 0o777;
        assert_eq!(mode & 0o077, 0, "mode {mode:o}");
    }

    #[test]
    fn existing_directory_is_fine() {
        let temp = tempfile::tempdir().expect("tempdir");
        ensure_parent_dir(&temp.path().join("settings.json")).expect("first");
        ensure_parent_dir(&temp.path().join("settings.json")).expect("second");
    }

    #[test]
    fn parent_that_is_a_file_fails_directory_creation() {
        let temp = tempfile::tempdir().expect("tempdir");
        let blocker = temp.path().join(".claude");
        fs::write(&blocker, "not a dir").expect("write");
        let err = ensure_parent_dir(&blocker.join("settings.json")).unwrap_err();
        assert_eq!(err.kind(), SetupErrorKind::DirectoryCreateFailure);
    }

    #[test]
    fn uncommitted_stage_leaves_original_untouched() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("settings.json");
        fs::write(&path, "{\"old\": true}\n").expect("seed");

        let staged = StagedWrite::stage(&path, "{\"new\": true}\n").expect("stage");
        let temp_path = staged.temp_path().to_path_buf();
        assert_eq!(fs::read_to_string(&temp_path).expect("temp"), "{\"new\": true}\n");
        assert_eq!(fs::read_to_string(&path).expect("target"), "{\"old\": true}\n");

        // Interrupted before the rename.
        drop(staged);
        assert_eq!(fs::read_to_string(&path).expect("target"), "{\"old\": true}\n");
        assert!(!temp_path.exists());
    }

    #[test]
    fn failed_commit_removes_temp_and_reports_io() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("settings.json");
        fs::create_dir(&path).expect("dir in the way");
        fs::write(path.join("keep"), "x").expect("populate");

        let staged = StagedWrite::stage(&path, "{}\n").expect("stage");
        let temp_path = staged.temp_path().to_path_buf();
        let err = staged.commit().unwrap_err();
        assert_eq!(err.kind(), SetupErrorKind::Io);
        assert!(!temp_path.exists());
        assert!(path.join("keep").is_file());
    }

    #[test]
    fn failure_after_create_removes_temp_and_returns_write_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("settings.json");
        fs::write(&path, "{\"old\": true}\n").expect("seed");

        let err = StagedWrite::stage_with(&path, |file| {
            file.write_all(b"{\"half")?;
            Err(std::io::Error::other("disk full"))
        })
        .unwrap_err();

        assert_eq!(err.kind(), SetupErrorKind::Io);
        assert!(err.to_string().contains("disk full"), "{err}");
        assert!(err.to_string().contains(&path.display().to_string()), "{err}");
        assert!(stray_temp_files(&path).is_empty());
        assert_eq!(fs::read_to_string(&path).expect("target"), "{\"old\": true}\n");
    }

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().expect("log lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn cleanup_failure_is_logged_not_raised() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("settings.json");
        let staged = StagedWrite::stage(&path, "{}\n").expect("stage");
        let temp_path = staged.temp_path().to_path_buf();

        // A non-empty directory where the temp file was cannot be unlinked.
        fs::remove_file(&temp_path).expect("remove temp");
        fs::create_dir(&temp_path).expect("dir in the way");
        fs::write(temp_path.join("keep"), "x").expect("populate");

        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || drop(staged));

        let output = String::from_utf8(log.0.lock().expect("log lock").clone()).expect("utf8");
        assert!(output.contains("WARN"), "{output}");
        assert!(output.contains("failed to remove temp settings file"), "{output}");
        assert!(temp_path.join("keep").is_file());
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn rewrite_keeps_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("settings.json");
        fs::write(&path, "{}\n").expect("seed");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).expect("chmod");

        write_config(&path, &Config::with_empty_plugins()).expect("write");
        let mode = fs::metadata(&path).expect("meta").permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn read_only_directory_is_access_denied() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().expect("tempdir");
        let dir = temp.path().join("locked");
        fs::create_dir(&dir).expect("mkdir");
        let path = dir.join("settings.json");
        fs::write(&path, "{\"old\": 1}\n").expect("seed");
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o500)).expect("chmod");
        if fs::write(dir.join("writable"), "").is_ok() {
            // Privileged users bypass mode bits.
            fs::set_permissions(&dir, fs::Permissions::from_mode(0o700)).expect("chmod");
            return;
        }

        let err = write_config(&path, &Config::with_empty_plugins()).unwrap_err();
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o700)).expect("chmod");
        assert_eq!(err.kind(), SetupErrorKind::AccessDenied);
        assert!(err.to_string().contains(&dir.display().to_string()));
        assert_eq!(fs::read_to_string(&path).expect("read"), "{\"old\": 1}\n");
    }
}
