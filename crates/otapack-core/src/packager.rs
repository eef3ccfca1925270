//! Per-target artifact packaging.
//!
//! For one [`Target`] this locates the compiled binary, hashes it, copies it
//! into `<output>/firmware/<chip>/<channel>/`, writes the manifest next to it
//! and bundles the optional flashing archive. Re-running with the same version
//! and channel overwrites the same files.

use crate::error::{PackageError, Result};
use crate::paths;
use crate::registry::Target;
use chrono::{DateTime, SecondsFormat, Utc};
use otapack_schema::{ConfigDefaults, FirmwareManifest, IndexEntry, Md5Digest};
use std::fs;
use std::path::Path;

/// Identity of one packaging run. Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub version: String,
    pub channel: String,
    /// ISO-8601, second precision.
    pub published_at: String,
}

impl Release {
    /// Build a release, validating the channel and the optional timestamp
    /// override. Without an override the current UTC time is used.
    ///
    /// # Errors
    ///
    /// [`PackageError::InvalidVersion`], [`PackageError::InvalidChannel`] or
    /// [`PackageError::InvalidTimestamp`].
    pub fn new(version: String, channel: &str, published_at: Option<&str>) -> Result<Self> {
        crate::version::validate_version(&version)?;
        validate_channel(channel)?;

        let published_at = match published_at.map(str::trim).filter(|s| !s.is_empty()) {
            Some(value) => {
                DateTime::parse_from_rfc3339(value).map_err(|source| {
                    PackageError::InvalidTimestamp {
                        value: value.to_string(),
                        source,
                    }
                })?;
                value.to_string()
            }
            None => now_timestamp(),
        };

        Ok(Self {
            version,
            channel: channel.to_string(),
            published_at,
        })
    }
}

/// Current UTC time as `YYYY-MM-DDTHH:MM:SS+00:00`.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, false)
}

fn validate_channel(channel: &str) -> Result<()> {
    let bad = channel.is_empty()
        || channel == "."
        || channel == ".."
        || channel.contains(['/', '\\'])
        || channel.trim() != channel;
    if bad {
        return Err(PackageError::InvalidChannel(channel.to_string()));
    }
    Ok(())
}

/// Summary of one packaged target. Paths are relative to the output root
/// and use `/` separators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub target: Target,
    pub version: String,
    pub channel: String,
    pub size: u64,
    pub md5: Md5Digest,
    pub binary_path: String,
    pub manifest_path: String,
    pub archive_path: Option<String>,
}

impl Artifact {
    /// Entry for the release index.
    pub fn to_index_entry(&self) -> IndexEntry {
        IndexEntry {
            env: self.target.env.to_string(),
            chip: self.target.chip.to_string(),
            channel: self.channel.clone(),
            manifest: self.manifest_path.clone(),
            binary: self.binary_path.clone(),
            zip: self.archive_path.clone(),
            md5: self.md5.clone(),
            size: self.size,
        }
    }
}

/// Everything a packaging run shares across targets.
#[derive(Debug, Clone, Copy)]
pub struct Packager<'a> {
    pub release: &'a Release,
    /// Root of per-environment build outputs.
    pub build_root: &'a Path,
    /// Destination root of the distribution tree.
    pub output: &'a Path,
    /// Where pre-built `<env>.zip` archives are looked up.
    pub archive_dir: &'a Path,
    pub defaults: Option<&'a ConfigDefaults>,
}

impl Packager<'_> {
    /// Package one target.
    ///
    /// Returns `Ok(None)` when the target's binary has not been built; that
    /// is logged and is not an error.
    ///
    /// # Errors
    ///
    /// I/O and serialization failures while writing the destination tree.
    /// Files already written for this target are left in place.
    pub fn package(&self, target: Target) -> Result<Option<Artifact>> {
        let source = paths::source_binary(self.build_root, target.env);
        if !source.is_file() {
            tracing::warn!(
                "skipping {}, firmware not found at {}",
                target.env,
                source.display()
            );
            return Ok(None);
        }

        let (md5, size) = Md5Digest::compute_file(&source)
            .map_err(|e| PackageError::io("Failed to hash firmware", &source, e))?;

        let release = self.release;
        let channel_dir = paths::channel_dir(self.output, target.chip, &release.channel);
        fs::create_dir_all(&channel_dir)
            .map_err(|e| PackageError::io("Failed to create channel directory", &channel_dir, e))?;

        let binary_name = paths::binary_name(target.chip, &release.version);
        let binary_dest = channel_dir.join(&binary_name);
        fs::copy(&source, &binary_dest)
            .map_err(|e| PackageError::io("Failed to copy firmware", &binary_dest, e))?;
        tracing::debug!("copied {} -> {}", source.display(), binary_dest.display());

        let manifest = FirmwareManifest {
            version: release.version.clone(),
            channel: release.channel.clone(),
            chip: target.chip.to_string(),
            size,
            md5: md5.clone(),
            url: binary_name,
            published_at: release.published_at.clone(),
            env: target.env.to_string(),
            mqtt: self.defaults.filter(|d| !d.is_empty()).cloned(),
        };
        let manifest_dest = paths::manifest_path(self.output, target.chip, &release.channel);
        let json = manifest
            .to_json_pretty()
            .map_err(|e| PackageError::json("manifest", e))?;
        fs::write(&manifest_dest, json)
            .map_err(|e| PackageError::io("Failed to write manifest", &manifest_dest, e))?;

        let archive_dest = self.bundle_archive(target)?;

        let artifact = Artifact {
            target,
            version: release.version.clone(),
            channel: release.channel.clone(),
            size,
            md5,
            binary_path: paths::relative_posix(self.output, &binary_dest),
            manifest_path: paths::relative_posix(self.output, &manifest_dest),
            archive_path: archive_dest.map(|p| paths::relative_posix(self.output, &p)),
        };

        tracing::info!(
            "packaged {} ({} bytes, md5 {}) -> {}",
            target.env,
            size,
            artifact.md5,
            artifact.binary_path
        );
        Ok(Some(artifact))
    }

    /// Copy `<archive_dir>/<env>.zip` into `releases/` if it exists.
    fn bundle_archive(&self, target: Target) -> Result<Option<std::path::PathBuf>> {
        let source = paths::source_archive(self.archive_dir, target.env);
        if !source.is_file() {
            return Ok(None);
        }

        let releases = paths::releases_dir(self.output);
        fs::create_dir_all(&releases)
            .map_err(|e| PackageError::io("Failed to create releases directory", &releases, e))?;

        let dest = releases.join(paths::archive_name(target.chip, &self.release.version));
        fs::copy(&source, &dest)
            .map_err(|e| PackageError::io("Failed to copy archive", &dest, e))?;
        Ok(Some(dest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry;
    use otapack_schema::ConfigValue;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        release: Release,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            for sub in ["build", "dist", "work"] {
                fs::create_dir_all(dir.path().join(sub)).unwrap();
            }
            let release =
                Release::new("v1.2.3".into(), "stable", Some("2026-01-02T03:04:05+00:00"))
                    .unwrap();
            Self { dir, release }
        }

        fn build(&self, env: &str, bytes: &[u8]) {
            let path = paths::source_binary(&self.dir.path().join("build"), env);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, bytes).unwrap();
        }

        fn out(&self) -> std::path::PathBuf {
            self.dir.path().join("dist")
        }

        fn package(&self, env: &str, defaults: Option<&ConfigDefaults>) -> Option<Artifact> {
            let build = self.dir.path().join("build");
            let out = self.out();
            let work = self.dir.path().join("work");
            let packager = Packager {
                release: &self.release,
                build_root: &build,
                output: &out,
                archive_dir: &work,
                defaults,
            };
            packager.package(registry::lookup(env).unwrap()).unwrap()
        }
    }

    #[test]
    fn missing_binary_is_skipped() {
        let fx = Fixture::new();
        assert!(fx.package("esp32s2", None).is_none());
        assert!(!fx.out().join("firmware").exists());
    }

    #[test]
    fn packages_binary_and_manifest() {
        let fx = Fixture::new();
        fx.build("esp32", b"esp32 firmware image");

        let artifact = fx.package("esp32", None).unwrap();
        assert_eq!(artifact.binary_path, "firmware/esp32/stable/esp32-v1.2.3.bin");
        assert_eq!(artifact.manifest_path, "firmware/esp32/stable/manifest.json");
        assert_eq!(artifact.archive_path, None);
        assert_eq!(artifact.size, 20);

        // Copy must not corrupt bytes.
        let (copied, _) = Md5Digest::compute_file(&fx.out().join(&artifact.binary_path)).unwrap();
        assert_eq!(copied, artifact.md5);

        let manifest = FirmwareManifest::from_json(
            &fs::read_to_string(fx.out().join(&artifact.manifest_path)).unwrap(),
        )
        .unwrap();
        assert_eq!(manifest.url, "esp32-v1.2.3.bin");
        assert_eq!(manifest.md5, artifact.md5);
        assert_eq!(manifest.published_at, "2026-01-02T03:04:05+00:00");
        assert_eq!(manifest.env, "esp32");
        assert!(manifest.mqtt.is_none());
    }

    #[test]
    fn embeds_defaults_only_when_non_empty() {
        let fx = Fixture::new();
        fx.build("esp32", b"x");

        let empty = ConfigDefaults::new();
        let artifact = fx.package("esp32", Some(&empty)).unwrap();
        let json = fs::read_to_string(fx.out().join(&artifact.manifest_path)).unwrap();
        assert!(!json.contains("mqtt"));

        let mut defaults = ConfigDefaults::new();
        defaults.insert("port", ConfigValue::Integer(1883));
        let artifact = fx.package("esp32", Some(&defaults)).unwrap();
        let manifest = FirmwareManifest::from_json(
            &fs::read_to_string(fx.out().join(&artifact.manifest_path)).unwrap(),
        )
        .unwrap();
        assert_eq!(manifest.mqtt, Some(defaults));
    }

    #[test]
    fn bundles_archive_when_present() {
        let fx = Fixture::new();
        fx.build("esp32c3", b"c3");
        fs::write(fx.dir.path().join("work/esp32c3.zip"), b"PK\x03\x04").unwrap();

        let artifact = fx.package("esp32c3", None).unwrap();
        assert_eq!(
            artifact.archive_path.as_deref(),
            Some("releases/esp32c3-v1.2.3.zip")
        );
        assert_eq!(
            fs::read(fx.out().join("releases/esp32c3-v1.2.3.zip")).unwrap(),
            b"PK\x03\x04"
        );
    }

    #[test]
    fn republishing_is_idempotent_and_keeps_siblings() {
        let fx = Fixture::new();
        fx.build("esp32", b"same bytes");
        let sibling = paths::channel_dir(&fx.out(), "esp32", "stable").join("esp32-v1.0.0.bin");
        fs::create_dir_all(sibling.parent().unwrap()).unwrap();
        fs::write(&sibling, b"old release").unwrap();

        let first = fx.package("esp32", None).unwrap();
        let manifest_1 = fs::read(fx.out().join(&first.manifest_path)).unwrap();
        let second = fx.package("esp32", None).unwrap();
        let manifest_2 = fs::read(fx.out().join(&second.manifest_path)).unwrap();

        assert_eq!(first, second);
        assert_eq!(manifest_1, manifest_2);
        assert!(sibling.exists());
    }

    #[test]
    fn release_validation() {
        assert!(Release::new("v1".into(), "beta", None).is_ok());
        assert!(matches!(
            Release::new("v1".into(), "../stable", None),
            Err(PackageError::InvalidChannel(_))
        ));
        assert!(matches!(
            Release::new("v1".into(), "", None),
            Err(PackageError::InvalidChannel(_))
        ));
        assert!(matches!(
            Release::new("v1".into(), "stable", Some("yesterday")),
            Err(PackageError::InvalidTimestamp { .. })
        ));
        assert!(matches!(
            Release::new("a/b".into(), "stable", None),
            Err(PackageError::InvalidVersion(_))
        ));
    }

    #[test]
    fn default_timestamp_is_utc_seconds() {
        let release = Release::new("v1".into(), "stable", None).unwrap();
        assert!(release.published_at.ends_with("+00:00"));
        assert_eq!(release.published_at.len(), "2026-01-02T03:04:05+00:00".len());
    }
}
