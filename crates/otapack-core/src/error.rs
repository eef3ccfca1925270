//! Fatal packaging errors.
//!
//! Anything that reaches the caller as a `PackageError` aborts the run.
//! Per-target skips and per-field drops are handled where they occur and
//! never surface here.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PackageError {
    #[error("Unknown build environment(s): {}", .0.join(", "))]
    UnknownTargets(Vec<String>),

    #[error("Version header not found at {}. Run the firmware build first.", .path.display())]
    VersionHeaderMissing { path: PathBuf },

    #[error("Unable to extract VERSION_STRING from {}", .path.display())]
    VersionNotFound { path: PathBuf },

    #[error("Invalid version '{0}': must be non-empty and contain no path separators")]
    InvalidVersion(String),

    #[error("Invalid channel '{0}': must be a single non-empty path segment")]
    InvalidChannel(String),

    #[error("Invalid published-at timestamp '{value}': {source}")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("{context} ({}): {source}", .path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize {context}: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl PackageError {
    /// Wrap an I/O error with what was being done and to which path.
    pub fn io(context: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            context,
            path: path.into(),
            source,
        }
    }

    /// Wrap a serialization error.
    pub fn json(context: &'static str, source: serde_json::Error) -> Self {
        Self::Json { context, source }
    }
}

pub type Result<T, E = PackageError> = std::result::Result<T, E>;
