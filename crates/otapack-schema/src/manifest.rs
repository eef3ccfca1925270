//! Per-artifact manifest document.

use crate::config::ConfigDefaults;
use crate::hash::Md5Digest;
use serde::{Deserialize, Serialize};

/// Per-artifact manifest (`manifest.json`).
///
/// This is the document a device fetches from its chip/channel directory to
/// learn whether an update is available and how to validate it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareManifest {
    /// Release version string (e.g. "v1.2.3").
    pub version: String,

    /// Update channel the artifact was published to (e.g. "stable").
    pub channel: String,

    /// OTA chip identifier the device matches against.
    pub chip: String,

    /// Binary size in bytes.
    pub size: u64,

    /// MD5 of the binary.
    pub md5: Md5Digest,

    /// Binary file name, relative to the manifest's directory.
    pub url: String,

    /// ISO-8601 publication timestamp.
    pub published_at: String,

    /// Build environment the binary was compiled for.
    pub env: String,

    /// Broker defaults baked into the release, if any were resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mqtt: Option<ConfigDefaults>,
}

impl FirmwareManifest {
    /// Render as pretty-printed JSON (2-space indent).
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a manifest from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a valid manifest, including an
    /// invalid `md5` value.
    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigValue;

    fn sample() -> FirmwareManifest {
        FirmwareManifest {
            version: "v1.2.3".into(),
            channel: "stable".into(),
            chip: "esp32".into(),
            size: 1024,
            md5: Md5Digest::compute(b"firmware"),
            url: "esp32-v1.2.3.bin".into(),
            published_at: "2026-01-02T03:04:05+00:00".into(),
            env: "esp32".into(),
            mqtt: None,
        }
    }

    #[test]
    fn mqtt_omitted_when_absent() {
        let json = sample().to_json_pretty().unwrap();
        assert!(!json.contains("mqtt"));
        assert!(json.contains("\"url\": \"esp32-v1.2.3.bin\""));
    }

    #[test]
    fn field_order_is_stable() {
        let json = serde_json::to_string(&sample()).unwrap();
        let keys = [
            "\"version\"",
            "\"channel\"",
            "\"chip\"",
            "\"size\"",
            "\"md5\"",
            "\"url\"",
            "\"published_at\"",
            "\"env\"",
        ];
        let positions: Vec<usize> = keys.iter().map(|k| json.find(k).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn parses_back_with_mqtt() {
        let mut manifest = sample();
        let mut mqtt = ConfigDefaults::new();
        mqtt.insert("port", ConfigValue::Integer(1883));
        manifest.mqtt = Some(mqtt);

        let json = manifest.to_json_pretty().unwrap();
        let parsed = FirmwareManifest::from_json(&json).unwrap();
        assert_eq!(parsed, manifest);
    }
}
