//! Re-check a published tree: every manifest's binary must exist and match
//! the size and MD5 the manifest advertises.

use crate::error::{PackageError, Result};
use crate::paths;
use otapack_schema::{FirmwareManifest, MANIFEST_FILE, Md5Digest};
use std::path::{Path, PathBuf};

/// Outcome for one manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyStatus {
    Ok,
    /// The manifest could not be parsed.
    Unreadable(String),
    /// The binary the manifest names does not exist.
    MissingBinary,
    SizeMismatch { expected: u64, actual: u64 },
    ChecksumMismatch { expected: Md5Digest, actual: Md5Digest },
}

#[derive(Debug, Clone)]
pub struct VerifyReport {
    /// Manifest path relative to the output root.
    pub manifest: String,
    pub status: VerifyStatus,
}

impl VerifyReport {
    pub fn is_ok(&self) -> bool {
        self.status == VerifyStatus::Ok
    }
}

impl std::fmt::Display for VerifyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Unreadable(e) => write!(f, "unreadable manifest: {e}"),
            Self::MissingBinary => write!(f, "binary missing"),
            Self::SizeMismatch { expected, actual } => {
                write!(f, "size mismatch: manifest {expected}, file {actual}")
            }
            Self::ChecksumMismatch { expected, actual } => {
                write!(f, "md5 mismatch: manifest {expected}, file {actual}")
            }
        }
    }
}

/// Verify every `manifest.json` under `<output>/firmware`, in path order.
///
/// # Errors
///
/// I/O failures walking the tree or hashing a binary that exists.
pub fn verify_tree(output: &Path) -> Result<Vec<VerifyReport>> {
    let root = paths::firmware_dir(output);
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut manifests: Vec<PathBuf> = Vec::new();
    for entry in walkdir::WalkDir::new(&root).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().map_or_else(|| root.clone(), Path::to_path_buf);
            PackageError::io("Failed to walk firmware tree", path, e.into())
        })?;
        if entry.file_type().is_file() && entry.file_name() == MANIFEST_FILE {
            manifests.push(entry.into_path());
        }
    }

    manifests
        .iter()
        .map(|path| {
            let status = verify_manifest(path)?;
            Ok(VerifyReport {
                manifest: paths::relative_posix(output, path),
                status,
            })
        })
        .collect()
}

/// Verify one manifest against the binary next to it.
///
/// # Errors
///
/// I/O failures reading the manifest or hashing the binary.
pub fn verify_manifest(manifest_path: &Path) -> Result<VerifyStatus> {
    let content = std::fs::read_to_string(manifest_path)
        .map_err(|e| PackageError::io("Failed to read manifest", manifest_path, e))?;
    let manifest = match FirmwareManifest::from_json(&content) {
        Ok(m) => m,
        Err(e) => return Ok(VerifyStatus::Unreadable(e.to_string())),
    };

    let dir = manifest_path.parent().unwrap_or_else(|| Path::new("."));
    let binary = dir.join(&manifest.url);
    if !binary.is_file() {
        return Ok(VerifyStatus::MissingBinary);
    }

    let (actual, size) = Md5Digest::compute_file(&binary)
        .map_err(|e| PackageError::io("Failed to hash firmware", &binary, e))?;

    if size != manifest.size {
        return Ok(VerifyStatus::SizeMismatch {
            expected: manifest.size,
            actual: size,
        });
    }
    if actual != manifest.md5 {
        return Ok(VerifyStatus::ChecksumMismatch {
            expected: manifest.md5,
            actual,
        });
    }
    Ok(VerifyStatus::Ok)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packager::{Packager, Release};
    use crate::registry;
    use std::fs;
    use tempfile::TempDir;

    fn publish(dir: &TempDir, env: &str) -> PathBuf {
        let build = dir.path().join("build");
        let out = dir.path().join("dist");
        let src = paths::source_binary(&build, env);
        fs::create_dir_all(src.parent().unwrap()).unwrap();
        fs::write(&src, format!("{env} image")).unwrap();

        let release = Release::new("v1".into(), "stable", None).unwrap();
        let packager = Packager {
            release: &release,
            build_root: &build,
            output: &out,
            archive_dir: dir.path(),
            defaults: None,
        };
        packager
            .package(registry::lookup(env).unwrap())
            .unwrap()
            .unwrap();
        out
    }

    #[test]
    fn fresh_tree_verifies() {
        let dir = TempDir::new().unwrap();
        publish(&dir, "esp32");
        let out = publish(&dir, "esp32s3");

        let reports = verify_tree(&out).unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(VerifyReport::is_ok));
        assert_eq!(reports[0].manifest, "firmware/esp32/stable/manifest.json");
    }

    #[test]
    fn detects_tampered_binary() {
        let dir = TempDir::new().unwrap();
        let out = publish(&dir, "esp32");
        let bin = paths::channel_dir(&out, "esp32", "stable").join("esp32-v1.bin");

        // Same length, different content.
        fs::write(&bin, b"ESP32 IMAGE").unwrap();
        let reports = verify_tree(&out).unwrap();
        assert!(matches!(
            reports[0].status,
            VerifyStatus::ChecksumMismatch { .. }
        ));

        fs::write(&bin, b"short").unwrap();
        let reports = verify_tree(&out).unwrap();
        assert_eq!(
            reports[0].status,
            VerifyStatus::SizeMismatch {
                expected: 11,
                actual: 5
            }
        );

        fs::remove_file(&bin).unwrap();
        let reports = verify_tree(&out).unwrap();
        assert_eq!(reports[0].status, VerifyStatus::MissingBinary);
    }

    #[test]
    fn missing_tree_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(verify_tree(dir.path()).unwrap().is_empty());
    }
}
