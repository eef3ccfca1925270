//! Release-wide index generation.

use crate::error::{PackageError, Result};
use crate::packager::{Artifact, Release};
use crate::paths;
use otapack_schema::ReleaseIndex;
use std::fs;
use std::path::{Path, PathBuf};

/// Fold this run's artifacts into an index document.
///
/// Returns `None` for an empty run: a release with no artifacts has no index.
pub fn build_index(release: &Release, artifacts: &[Artifact]) -> Option<ReleaseIndex> {
    if artifacts.is_empty() {
        return None;
    }
    Some(ReleaseIndex {
        generated_at: release.published_at.clone(),
        version: release.version.clone(),
        artifacts: artifacts.iter().map(Artifact::to_index_entry).collect(),
    })
}

/// Write `<output>/firmware/index.json`, fully replacing any previous index.
///
/// Nothing is written (and `None` returned) when `artifacts` is empty.
///
/// # Errors
///
/// I/O and serialization failures.
pub fn write_index(output: &Path, release: &Release, artifacts: &[Artifact]) -> Result<Option<PathBuf>> {
    let Some(index) = build_index(release, artifacts) else {
        tracing::warn!("no firmware artifacts were packaged, skipping index.json");
        return Ok(None);
    };

    let path = paths::index_path(output);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| PackageError::io("Failed to create firmware directory", parent, e))?;
    }

    let json = index
        .to_json_pretty()
        .map_err(|e| PackageError::json("release index", e))?;
    fs::write(&path, json).map_err(|e| PackageError::io("Failed to write index", &path, e))?;

    tracing::info!(
        "wrote {} ({} artifacts)",
        path.display(),
        index.artifacts.len()
    );
    Ok(Some(path))
}
