//! Extracted record - field values read from one inspection report

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// A mapping from semantic field name (`insured_name`, `address_city`, ...) to a
/// value or null.
///
/// Keys keep the order in which they were produced, which for model output is
/// the schema's declared order followed by any extra keys. A missing key and a
/// null value mean the same thing. Records are immutable once built; use
/// [`ExtractedRecord::with_overlay`] to derive an enriched copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedRecord {
    fields: Vec<(String, Option<String>)>,
}

impl ExtractedRecord {
    /// An empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from ordered `(key, value)` pairs.
    ///
    /// Values are trimmed and blank values become null. A repeated key keeps its
    /// first position and takes the later value.
    pub fn from_fields<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<String>)>,
        K: Into<String>,
    {
        let mut record = Self::new();
        for (key, value) in fields {
            record.set(key.into(), value);
        }
        record
    }

    /// A record with every key of `keys` present and null
    pub fn all_null<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self::from_fields(keys.into_iter().map(|k| (k, None)))
    }

    fn set(&mut self, key: String, value: Option<String>) {
        let value = value.and_then(normalize_value);
        if let Some(slot) = self.fields.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.fields.push((key, value));
        }
    }

    /// The non-empty value for `key`, if any
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    /// True when the key was produced at all (even as null)
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == key)
    }

    /// Keys in production order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    /// `(key, value)` pairs in production order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// Keys with a usable value, in production order
    pub fn populated(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .filter_map(|(k, v)| v.as_deref().map(|v| (k.as_str(), v)))
    }

    /// Number of keys (null or not)
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of keys that carry a value
    pub fn populated_count(&self) -> usize {
        self.populated().count()
    }

    /// A new record with `overlay` values laid over this one.
    ///
    /// Non-empty overlay values replace same-named fields or are appended as new
    /// keys; blank overlay values never erase existing data.
    pub fn with_overlay<'a, I>(&self, overlay: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut merged = self.clone();
        for (key, value) in overlay {
            if let Some(value) = normalize_value(value.to_string()) {
                merged.set(key.to_string(), Some(value));
            }
        }
        merged
    }

    /// Plain map view, handy for prompts and reports
    pub fn to_map(&self) -> BTreeMap<String, Option<String>> {
        self.fields.iter().cloned().collect()
    }
}

fn normalize_value(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == value.len() {
        Some(value)
    } else {
        Some(trimmed.to_string())
    }
}

impl Serialize for ExtractedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ExtractedRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // serde_json's default map is sorted, so order is not recoverable here
        let map = BTreeMap::<String, Option<String>>::deserialize(deserializer)?;
        Ok(Self::from_fields(map))
    }
}
