//! Error taxonomy for the settings merge pipeline.
//!
//! Reader and writer failures are typed so the orchestrator can name the exact
//! cause (and a remediation, where one exists) instead of a generic failure.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SetupError>;

/// Filesystem operation that was in flight when an I/O error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Write,
    Replace,
    CreateDirectory,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Replace => "replace",
            Self::CreateDirectory => "create directory",
        };
        f.write_str(verb)
    }
}

/// Stable, serializable classification of a [`SetupError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MalformedConfig,
    AccessDenied,
    SerializationFailure,
    DirectoryCreateFailure,
    InvalidIdentifier,
    Io,
    NoHomeDirectory,
}

#[derive(Debug, Error)]
pub enum SetupError {
    /// Existing settings content is unparsable or has the wrong shape.
    /// The file is never repaired or replaced in this case.
    #[error(
        "settings file {} is malformed: {detail}\nFix or remove the file by hand; it was left unchanged.",
        path.display()
    )]
    MalformedConfig { path: PathBuf, detail: String },

    #[error(
        "permission denied: cannot {operation} {}\n{}",
        path.display(),
        remediation(path, *operation)
    )]
    AccessDenied { path: PathBuf, operation: Operation },

    /// The engine produced output it could not parse back.
    #[error("internal error: serialized settings failed self-check: {detail}")]
    SerializationFailure { detail: String },

    #[error("failed to create directory {}: {source}", path.display())]
    DirectoryCreateFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid plugin identifier {raw:?}: name must not be empty")]
    InvalidIdentifier { raw: String },

    #[error("failed to {operation} {}: {source}", path.display())]
    Io {
        path: PathBuf,
        operation: Operation,
        #[source]
        source: io::Error,
    },

    #[error("could not determine home directory; pass --settings <PATH>")]
    NoHomeDirectory,
}

impl SetupError {
    /// Classify an I/O error, splitting permission failures from the rest.
    pub fn from_io(path: &Path, operation: Operation, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::PermissionDenied {
            return Self::AccessDenied {
                path: path.to_path_buf(),
                operation,
            };
        }
        Self::Io {
            path: path.to_path_buf(),
            operation,
            source,
        }
    }

    pub fn malformed(path: &Path, detail: impl Into<String>) -> Self {
        Self::MalformedConfig {
            path: path.to_path_buf(),
            detail: detail.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedConfig { .. } => ErrorKind::MalformedConfig,
            Self::AccessDenied { .. } => ErrorKind::AccessDenied,
            Self::SerializationFailure { .. } => ErrorKind::SerializationFailure,
            Self::DirectoryCreateFailure { .. } => ErrorKind::DirectoryCreateFailure,
            Self::InvalidIdentifier { .. } => ErrorKind::InvalidIdentifier,
            Self::Io { .. } => ErrorKind::Io,
            Self::NoHomeDirectory => ErrorKind::NoHomeDirectory,
        }
    }
}

fn remediation(path: &Path, operation: Operation) -> String {
    match operation {
        Operation::Read => format!(
            "Make the file readable by your user, e.g.: chmod u+r {}",
            path.display()
        ),
        Operation::CreateDirectory => format!(
            "Create it yourself or fix ownership of its parent, e.g.: mkdir -p {0} && chown \"$USER\" {0}",
            path.display()
        ),
        Operation::Write | Operation::Replace => {
            let dir = path.parent().unwrap_or(path);
            format!(
                "Make the settings directory writable by your user, e.g.: chown \"$USER\" {0} && chmod u+rwx {0}",
                dir.display()
            )
        }
    }
}
