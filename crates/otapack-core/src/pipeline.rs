//! One full packaging run.
//!
//! Configuration is resolved up front so that a bad target list, version or
//! channel aborts before anything is written. Targets are then packaged one
//! at a time in order, and both indexes are regenerated from this run's
//! artifacts only.

use crate::config::{self, EnvFile, EnvSnapshot};
use crate::error::Result;
use crate::packager::{Artifact, Packager, Release};
use crate::{html, index, registry, version};
use std::path::PathBuf;

/// Options for a run, built once by the caller.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Requested build environments; empty means every registered target.
    pub envs: Vec<String>,
    pub channel: String,
    pub output: PathBuf,
    pub build_root: PathBuf,
    pub version: Option<String>,
    pub published_at: Option<String>,
    /// Generated header to read the version from when none is given.
    pub version_header: PathBuf,
    pub env_file: PathBuf,
    /// Directory holding optional `<env>.zip` flashing archives.
    pub archive_dir: PathBuf,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            envs: Vec::new(),
            channel: otapack_schema::DEFAULT_CHANNEL.to_string(),
            output: PathBuf::from(crate::paths::DEFAULT_OUTPUT),
            build_root: PathBuf::from(crate::paths::DEFAULT_BUILD_ROOT),
            version: None,
            published_at: None,
            version_header: PathBuf::from(version::DEFAULT_VERSION_HEADER),
            env_file: PathBuf::from(config::DEFAULT_ENV_FILE),
            archive_dir: PathBuf::from("."),
        }
    }
}

/// What a run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub release: Release,
    pub artifacts: Vec<Artifact>,
    /// Environments whose binary was not found.
    pub skipped: Vec<String>,
    pub index_path: Option<PathBuf>,
    pub root_index_path: PathBuf,
}

/// Execute a packaging run.
///
/// # Errors
///
/// Fatal conditions only: unknown targets, unresolvable version, invalid
/// channel or timestamp, and I/O failures writing the tree.
pub fn run(opts: &RunOptions, env: &EnvSnapshot) -> Result<RunSummary> {
    let targets = registry::expand(&opts.envs)?;
    let version = version::resolve_version(opts.version.as_deref(), &opts.version_header)?;
    let release = Release::new(version, &opts.channel, opts.published_at.as_deref())?;

    let defaults = config::load_defaults(config::MQTT_FIELDS, env, &EnvFile::load(&opts.env_file));
    if !defaults.is_empty() {
        tracing::info!("including {} MQTT defaults in manifests", defaults.len());
    }

    tracing::info!(
        "packaging {} target(s) for {} on channel {}",
        targets.len(),
        release.version,
        release.channel
    );

    let packager = Packager {
        release: &release,
        build_root: &opts.build_root,
        output: &opts.output,
        archive_dir: &opts.archive_dir,
        defaults: Some(&defaults),
    };

    let mut artifacts = Vec::with_capacity(targets.len());
    let mut skipped = Vec::new();
    for target in targets {
        match packager.package(target)? {
            Some(artifact) => artifacts.push(artifact),
            None => skipped.push(target.env.to_string()),
        }
    }

    let index_path = index::write_index(&opts.output, &release, &artifacts)?;
    let root_index_path = html::write_root_index(&opts.output, &release, &artifacts)?;

    Ok(RunSummary {
        release,
        artifacts,
        skipped,
        index_path,
        root_index_path,
    })
}
