//! Typed configuration defaults for manifests.
//!
//! Each declared field is looked up in the process environment first, then in
//! a `.env`-style file. Values that fail their type's parse rule are dropped
//! with a warning; nothing here is fatal.

use otapack_schema::{ConfigDefaults, ConfigValue};
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::Path;
use thiserror::Error;

/// Default key/value file, relative to the project root.
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Declared type of a configuration field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Boolean,
}

/// One declared field: manifest name, source key, type.
#[derive(Debug, Clone, Copy)]
pub struct ConfigField {
    pub name: &'static str,
    pub key: &'static str,
    pub kind: FieldKind,
}

const fn field(name: &'static str, key: &'static str, kind: FieldKind) -> ConfigField {
    ConfigField { name, key, kind }
}

/// Broker defaults embedded under `mqtt` in every manifest.
pub const MQTT_FIELDS: &[ConfigField] = &[
    field("host", "MQTT_DEFAULT_HOST", FieldKind::Text),
    field("port", "MQTT_DEFAULT_PORT", FieldKind::Integer),
    field("username", "MQTT_DEFAULT_USERNAME", FieldKind::Text),
    field("password", "MQTT_DEFAULT_PASSWORD", FieldKind::Text),
    field("client_id", "MQTT_DEFAULT_CLIENT_ID", FieldKind::Text),
    field("publish_topic", "MQTT_DEFAULT_PUBLISH_TOPIC", FieldKind::Text),
    field("subscribe_topic", "MQTT_DEFAULT_SUBSCRIBE_TOPIC", FieldKind::Text),
    field("payload_format", "MQTT_DEFAULT_PAYLOAD_FORMAT", FieldKind::Integer),
    field("ssl", "MQTT_DEFAULT_SSL", FieldKind::Boolean),
    field("state_update", "MQTT_DEFAULT_STATE_UPDATE", FieldKind::Boolean),
    field("state_update_interval", "MQTT_DEFAULT_STATE_UPDATE_INTERVAL", FieldKind::Integer),
    field("timeout", "MQTT_DEFAULT_TIMEOUT", FieldKind::Integer),
    field("keepalive", "MQTT_DEFAULT_KEEPALIVE", FieldKind::Integer),
];

const TRUTHY: &[&str] = &["1", "true", "yes", "on"];
const FALSY: &[&str] = &["0", "false", "no", "off"];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CoercionError {
    #[error("Invalid integer literal: '{0}'")]
    Integer(String),

    #[error("Invalid boolean literal: '{0}'")]
    Boolean(String),
}

/// Snapshot of environment variables, captured once per run.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot(HashMap<String, String>);

impl EnvSnapshot {
    /// Capture the current process environment.
    ///
    /// Variables whose name or value is not valid UTF-8 are left out; none of
    /// them can name a known setting.
    pub fn from_process() -> Self {
        Self::from_os(std::env::vars_os())
    }

    /// Build a snapshot from raw OS pairs, dropping non-UTF-8 entries.
    pub fn from_os<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        Self(
            vars.into_iter()
                .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
                    (Ok(key), Ok(value)) => Some((key, value)),
                    (Ok(key), Err(_)) => {
                        tracing::debug!("ignoring {key}, value is not valid UTF-8");
                        None
                    }
                    _ => None,
                })
                .collect(),
        )
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Parsed `KEY=value` file.
#[derive(Debug, Clone, Default)]
pub struct EnvFile(HashMap<String, String>);

impl EnvFile {
    /// Parse `.env` content.
    ///
    /// Blank lines, `#` comments and lines without `=` are ignored. One pair of
    /// matching `"` or `'` around a value is stripped. Later keys win.
    pub fn parse(content: &str) -> Self {
        let mut data = HashMap::new();
        for raw_line in content.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            data.insert(
                key.trim().to_string(),
                strip_quotes(value.trim()).to_string(),
            );
        }
        Self(data)
    }

    /// Load a `.env` file. A missing file is an empty set; an unreadable one
    /// is logged and treated as empty.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(e) => {
                tracing::warn!("ignoring unreadable env file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

fn strip_quotes(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2
        && bytes[0] == bytes[bytes.len() - 1]
        && matches!(bytes[0], b'"' | b'\'')
    {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// Parse an integer literal with optional sign and base prefix.
///
/// Accepts `0x`, `0o` and `0b` prefixes and `_` between digits. A decimal
/// literal may not start with `0` unless it is all zeros.
pub fn parse_integer(raw: &str) -> Result<i64, CoercionError> {
    let err = || CoercionError::Integer(raw.to_string());
    let s = raw.trim();

    let (negative, unsigned) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let lower = unsigned.to_ascii_lowercase();
    let (radix, digits) = if let Some(d) = lower.strip_prefix("0x") {
        (16, d.strip_prefix('_').unwrap_or(d))
    } else if let Some(d) = lower.strip_prefix("0o") {
        (8, d.strip_prefix('_').unwrap_or(d))
    } else if let Some(d) = lower.strip_prefix("0b") {
        (2, d.strip_prefix('_').unwrap_or(d))
    } else {
        (10, lower.as_str())
    };

    if digits.is_empty()
        || digits.starts_with(['_', '+', '-'])
        || digits.ends_with('_')
        || digits.contains("__")
    {
        return Err(err());
    }
    let cleaned: String = digits.chars().filter(|c| *c != '_').collect();
    if radix == 10
        && cleaned.len() > 1
        && cleaned.starts_with('0')
        && cleaned.chars().any(|c| c != '0')
    {
        return Err(err());
    }

    // Parse the magnitude with its sign attached so i64::MIN round-trips.
    let signed = if negative { format!("-{cleaned}") } else { cleaned };
    i64::from_str_radix(&signed, radix).map_err(|_| err())
}

/// Parse a boolean against the fixed truthy/falsy token sets.
pub fn parse_bool(raw: &str) -> Result<bool, CoercionError> {
    let lowered = raw.trim().to_ascii_lowercase();
    if TRUTHY.contains(&lowered.as_str()) {
        Ok(true)
    } else if FALSY.contains(&lowered.as_str()) {
        Ok(false)
    } else {
        Err(CoercionError::Boolean(raw.to_string()))
    }
}

/// Coerce a raw string into the declared kind.
pub fn coerce(kind: FieldKind, raw: &str) -> Result<ConfigValue, CoercionError> {
    match kind {
        FieldKind::Text => Ok(ConfigValue::Text(raw.to_string())),
        FieldKind::Integer => parse_integer(raw).map(ConfigValue::Integer),
        FieldKind::Boolean => parse_bool(raw).map(ConfigValue::Bool),
    }
}

/// Resolve every declared field.
///
/// Environment beats file. Missing and empty values are skipped silently;
/// values that fail coercion are skipped with a warning.
pub fn load_defaults(fields: &[ConfigField], env: &EnvSnapshot, file: &EnvFile) -> ConfigDefaults {
    let mut defaults = ConfigDefaults::new();

    for field in fields {
        let Some(raw) = env.get(field.key).or_else(|| file.get(field.key)) else {
            continue;
        };
        if raw.is_empty() {
            continue;
        }

        match coerce(field.kind, raw) {
            Ok(value) => defaults.insert(field.name, value),
            Err(e) => tracing::warn!("skipping config field {}: {e}", field.key),
        }
    }

    defaults
}
