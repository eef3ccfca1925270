//! Static mapping from build environments to OTA chip identifiers.
//!
//! Update [`REGISTRY`] when a new environment is added to the firmware build.

use crate::error::{PackageError, Result};

/// A packaging target: a build environment and the chip devices know it by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Target {
    /// Build environment identifier (locates the compiled binary).
    pub env: &'static str,
    /// Chip identifier used by devices to select their update stream.
    pub chip: &'static str,
}

/// Every known target, in packaging order.
pub const REGISTRY: &[Target] = &[
    Target { env: "esp8266", chip: "esp8266" },
    Target { env: "esp32", chip: "esp32" },
    Target { env: "esp32s2", chip: "esp32s2" },
    Target { env: "esp32s3", chip: "esp32s3" },
    Target { env: "esp32c3", chip: "esp32c3" },
    Target { env: "esp32solo", chip: "esp32solo" },
];

/// Look up a target by build environment.
pub fn lookup(env: &str) -> Option<Target> {
    REGISTRY.iter().copied().find(|t| t.env == env)
}

/// Expand the requested environments into targets.
///
/// An empty request selects the whole registry. Otherwise the request order
/// is kept and repeated environments are packaged once, at their first
/// position.
///
/// # Errors
///
/// [`PackageError::UnknownTargets`] listing every unknown environment. No
/// partial expansion is returned.
pub fn expand<S: AsRef<str>>(requested: &[S]) -> Result<Vec<Target>> {
    if requested.is_empty() {
        return Ok(REGISTRY.to_vec());
    }

    let unknown: Vec<String> = requested
        .iter()
        .map(AsRef::as_ref)
        .filter(|env| lookup(env).is_none())
        .map(str::to_string)
        .collect();
    if !unknown.is_empty() {
        return Err(PackageError::UnknownTargets(unknown));
    }

    let mut targets: Vec<Target> = Vec::with_capacity(requested.len());
    for target in requested.iter().filter_map(|env| lookup(env.as_ref())) {
        if targets.contains(&target) {
            tracing::debug!("ignoring repeated target {}", target.env);
            continue;
        }
        targets.push(target);
    }
    Ok(targets)
}
