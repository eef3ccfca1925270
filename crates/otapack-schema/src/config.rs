//! Typed configuration defaults embedded in firmware manifests.
//!
//! A device that has never been configured falls back to these values on
//! first boot. The set is ordered: entries serialize in the order they were
//! resolved, which keeps manifests byte-stable between runs.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A single typed setting value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// A boolean flag (`true` / `false` in JSON).
    Bool(bool),
    /// A signed integer.
    Integer(i64),
    /// Free-form text.
    Text(String),
}

/// Ordered mapping of setting name to typed value.
///
/// Serializes as a JSON object whose keys keep insertion order. Inserting an
/// existing name replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDefaults {
    entries: Vec<(String, ConfigValue)>,
}

impl ConfigDefaults {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value.
    pub fn insert(&mut self, name: impl Into<String>, value: ConfigValue) {
        let name = name.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == name) {
            slot.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    /// Look up a value by name.
    pub fn get(&self, name: &str) -> Option<&ConfigValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// Number of resolved settings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no setting was resolved.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Serialize for ConfigDefaults {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct ConfigDefaultsVisitor;

impl<'de> Visitor<'de> for ConfigDefaultsVisitor {
    type Value = ConfigDefaults;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of setting names to string, integer or boolean values")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut defaults = ConfigDefaults::new();
        while let Some((k, v)) = access.next_entry::<String, ConfigValue>()? {
            defaults.insert(k, v);
        }
        Ok(defaults)
    }
}

impl<'de> Deserialize<'de> for ConfigDefaults {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(ConfigDefaultsVisitor)
    }
}
