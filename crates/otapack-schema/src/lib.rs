//! Wire format for OTA firmware releases.
//!
//! Types in this crate are shared by the packager (producer) and anything
//! that reads a published tree back (verification, dashboards).

pub mod config;
pub mod hash;
pub mod index;
pub mod manifest;

// Re-exports
pub use config::{ConfigDefaults, ConfigValue};
pub use hash::{DigestError, Md5Digest};
pub use index::{IndexEntry, ReleaseIndex};
pub use manifest::FirmwareManifest;

/// Default update channel.
pub const DEFAULT_CHANNEL: &str = "stable";

/// File name of the per-artifact manifest inside a channel directory.
pub const MANIFEST_FILE: &str = "manifest.json";
