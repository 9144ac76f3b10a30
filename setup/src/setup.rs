//! Orchestration for `molcajete-setup add`.
//!
//! Sequences read → merge → write against an injected settings path and
//! folds every failure into a [`SetupOutcome`]; nothing escapes [`setup`] as
//! an error or panic.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::merge::merge_with_summary;
use crate::core::plugin_id::{PluginId, PluginSelection};
use crate::error::{ErrorKind, Result, SetupError};
use crate::io::reader::read_config;
use crate::io::writer::write_config;

/// Result of one setup invocation, as reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetupOutcome {
    pub success: bool,
    pub message: String,
    pub settings_path: PathBuf,
    /// Canonical ids of every requested plugin, in request order.
    pub plugins: Vec<String>,
    /// Subset of `plugins` that was not configured before this run.
    pub added: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
}

/// What a successful setup changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupReport {
    pub settings_path: PathBuf,
    pub plugins: Vec<PluginId>,
    pub added: Vec<PluginId>,
    /// True if no settings file existed before this run.
    pub created: bool,
}

/// Merge `requested` plugins into the settings at `settings_path`.
pub fn setup<S: AsRef<str>>(settings_path: &Path, requested: &[S]) -> SetupOutcome {
    match try_setup(settings_path, requested) {
        Ok(report) => {
            info!(
                path = %report.settings_path.display(),
                plugins = report.plugins.len(),
                added = report.added.len(),
                "settings updated"
            );
            SetupOutcome {
                success: true,
                message: success_message(&report),
                settings_path: report.settings_path,
                plugins: to_strings(&report.plugins),
                added: to_strings(&report.added),
                error: None,
            }
        }
        Err(err) => {
            warn!(path = %settings_path.display(), error = %err, "setup failed");
            failed_outcome(settings_path, &err)
        }
    }
}

/// Typed variant of [`setup`] for callers that want to match on the error.
pub fn try_setup<S: AsRef<str>>(settings_path: &Path, requested: &[S]) -> Result<SetupReport> {
    let selection = PluginSelection::parse(requested)?;
    debug!(
        path = %settings_path.display(),
        requested = selection.len(),
        "starting setup"
    );

    let existing = read_config(settings_path)?;
    let created = existing.is_none();
    let (merged, summary) = merge_with_summary(existing.as_ref(), &selection);
    write_config(settings_path, &merged)?;

    Ok(SetupReport {
        settings_path: settings_path.to_path_buf(),
        plugins: selection.iter().cloned().collect(),
        added: summary.added,
        created,
    })
}

/// Failure outcome for `err`. Also used by the CLI for errors raised before
/// the pipeline starts (e.g. resolving the default path).
pub fn failed_outcome(settings_path: &Path, err: &SetupError) -> SetupOutcome {
    SetupOutcome {
        success: false,
        message: format!("Setup failed: {err}"),
        settings_path: settings_path.to_path_buf(),
        plugins: Vec::new(),
        added: Vec::new(),
        error: Some(err.kind()),
    }
}

fn success_message(report: &SetupReport) -> String {
    let path = report.settings_path.display();
    if report.plugins.is_empty() {
        let verb = if report.created { "Created" } else { "Kept" };
        return format!("No plugins selected. {verb} {path}");
    }
    let noun = if report.plugins.len() == 1 {
        "plugin"
    } else {
        "plugins"
    };
    let names = to_strings(&report.plugins).join(", ");
    if report.added.is_empty() {
        let verb = if report.plugins.len() == 1 { "is" } else { "are" };
        return format!(
            "{} {noun} {verb} already configured in {path}: {names}",
            report.plugins.len()
        );
    }
    let mut message = format!(
        "Configured {} {noun} in {path}: {names}",
        report.plugins.len()
    );
    if report.added.len() != report.plugins.len() {
        message.push_str(&format!(" ({} new)", report.added.len()));
    }
    message
}

fn to_strings(ids: &[PluginId]) -> Vec<String> {
    ids.iter().map(|id| id.as_str().to_string()).collect()
}
