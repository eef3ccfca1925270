//! Release-wide index document.

use crate::hash::Md5Digest;
use serde::{Deserialize, Serialize};

/// Release-wide index (`firmware/index.json`).
///
/// Summarizes every artifact produced by one packaging run, for dashboards
/// and fleet tooling that want the whole release at a glance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseIndex {
    /// Timestamp of the run (same as the release's publication time).
    pub generated_at: String,

    /// Release version string.
    pub version: String,

    /// One entry per packaged target, in target order.
    pub artifacts: Vec<IndexEntry>,
}

/// A single artifact listed in the [`ReleaseIndex`].
///
/// All paths are relative to the output root and use `/` separators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Build environment identifier.
    pub env: String,

    /// OTA chip identifier.
    pub chip: String,

    /// Channel the artifact was published to.
    pub channel: String,

    /// Path of the artifact's `manifest.json`.
    pub manifest: String,

    /// Path of the copied firmware binary.
    pub binary: String,

    /// Path of the bundled flashing archive, `null` when none was bundled.
    pub zip: Option<String>,

    /// MD5 of the binary.
    pub md5: Md5Digest,

    /// Binary size in bytes.
    pub size: u64,
}

impl ReleaseIndex {
    /// Render as pretty-printed JSON (2-space indent).
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Parse an index from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a valid index document.
    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_zip_serializes_as_null() {
        let index = ReleaseIndex {
            generated_at: "2026-01-02T03:04:05+00:00".into(),
            version: "v1.0.0".into(),
            artifacts: vec![IndexEntry {
                env: "esp32".into(),
                chip: "esp32".into(),
                channel: "stable".into(),
                manifest: "firmware/esp32/stable/manifest.json".into(),
                binary: "firmware/esp32/stable/esp32-v1.0.0.bin".into(),
                zip: None,
                md5: Md5Digest::compute(b""),
                size: 0,
            }],
        };

        let json = index.to_json_pretty().unwrap();
        assert!(json.contains("\"zip\": null"));
        assert_eq!(ReleaseIndex::from_json(&json).unwrap(), index);
    }
}
