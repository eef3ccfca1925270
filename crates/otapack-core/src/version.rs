//! Release version resolution.
//!
//! The version is either given explicitly or read from the header that the
//! version-stamping build step generates, e.g.
//!
//! ```c
//! #define VERSION_STRING "v1.2.3"
//! ```

use crate::error::{PackageError, Result};
use std::path::Path;

/// Token identifying the version constant in the generated header.
pub const VERSION_TOKEN: &str = "VERSION_STRING";

/// Default location of the generated header, relative to the project root.
pub const DEFAULT_VERSION_HEADER: &str = "lib/FirmwareVersion/src/generated_version.h";

/// Resolve the release version.
///
/// An override that is non-empty after trimming wins. Otherwise the header
/// at `header` must exist and contain a quoted `VERSION_STRING` value.
///
/// # Errors
///
/// [`PackageError::VersionHeaderMissing`] when falling back to a header that
/// does not exist, [`PackageError::VersionNotFound`] when it has no usable
/// value, [`PackageError::Io`] when it cannot be read.
pub fn resolve_version(version_override: Option<&str>, header: &Path) -> Result<String> {
    if let Some(v) = version_override.map(str::trim).filter(|v| !v.is_empty()) {
        return Ok(v.to_string());
    }

    if !header.exists() {
        return Err(PackageError::VersionHeaderMissing {
            path: header.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(header)
        .map_err(|e| PackageError::io("Failed to read version header", header, e))?;

    let version = extract_version(&content).ok_or_else(|| PackageError::VersionNotFound {
        path: header.to_path_buf(),
    })?;

    tracing::debug!("resolved version {version} from {}", header.display());
    Ok(version)
}

/// Pull the quoted value off the first line mentioning [`VERSION_TOKEN`].
fn extract_version(content: &str) -> Option<String> {
    content
        .lines()
        .filter(|line| line.contains(VERSION_TOKEN))
        .find_map(|line| line.split('"').nth(1))
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Reject versions that would escape the file name they are embedded in.
///
/// # Errors
///
/// [`PackageError::InvalidVersion`] if the version is empty or contains a
/// path separator.
pub fn validate_version(version: &str) -> Result<()> {
    if version.is_empty() || version.contains(['/', '\\']) {
        return Err(PackageError::InvalidVersion(version.to_string()));
    }
    Ok(())
}
