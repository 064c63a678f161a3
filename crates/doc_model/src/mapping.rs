//! Mapping result - placeholder to replacement value assignment

use crate::PlaceholderName;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// Replacement value for one placeholder: a non-empty string or "unmapped".
///
/// An empty or whitespace-only value can not be represented; it collapses to
/// unmapped so the template engine leaves the bracket visible for review.
/// Any other value is kept exactly as given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappedValue(Option<String>);

impl MappedValue {
    /// A filled value, used verbatim; blank input becomes unmapped
    pub fn filled(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            Self(None)
        } else {
            Self(Some(value))
        }
    }

    /// The explicit unmapped marker
    pub fn unmapped() -> Self {
        Self(None)
    }

    pub fn from_option(value: Option<String>) -> Self {
        value.map(Self::filled).unwrap_or_default()
    }

    /// The replacement text, or `None` when unmapped
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_unmapped(&self) -> bool {
        self.0.is_none()
    }
}

impl Serialize for MappedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MappedValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::from_option(Option::<String>::deserialize(deserializer)?))
    }
}

/// Why a placeholder ended up unmapped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmappedReason {
    /// No rule produced a usable value
    NoMatch,
    /// The direct table declares this field is never sourced from a report
    NotSourced,
}

/// Which resolution rule produced a value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum MappingSource {
    /// Static placeholder-to-field table
    Direct { key: String },
    /// Name similarity between placeholder and record key
    Fuzzy { key: String, score: f64 },
    /// Assembled from several record keys
    Composite { family: String, keys: Vec<String> },
    /// Supplied by hand (e.g. a reviewer-edited mapping file)
    Manual,
    /// Nothing applied
    None { reason: UnmappedReason },
}

impl MappingSource {
    /// Short rule label: `direct`, `fuzzy`, `composite`, `manual` or `none`
    pub fn rule(&self) -> &'static str {
        match self {
            Self::Direct { .. } => "direct",
            Self::Fuzzy { .. } => "fuzzy",
            Self::Composite { .. } => "composite",
            Self::Manual => "manual",
            Self::None { .. } => "none",
        }
    }

    /// Record keys the value was read from
    pub fn keys(&self) -> Vec<&str> {
        match self {
            Self::Direct { key } | Self::Fuzzy { key, .. } => vec![key.as_str()],
            Self::Composite { keys, .. } => keys.iter().map(String::as_str).collect(),
            Self::Manual | Self::None { .. } => Vec::new(),
        }
    }
}

/// Value plus the rule metadata recorded while resolving it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldResolution {
    pub value: MappedValue,
    pub source: MappingSource,
}

impl FieldResolution {
    /// A resolved value; blank values become unmapped with `NoMatch`
    pub fn resolved(value: impl Into<String>, source: MappingSource) -> Self {
        let value = MappedValue::filled(value);
        if value.is_unmapped() {
            Self::unmapped(UnmappedReason::NoMatch)
        } else {
            Self { value, source }
        }
    }

    pub fn unmapped(reason: UnmappedReason) -> Self {
        Self {
            value: MappedValue::unmapped(),
            source: MappingSource::None { reason },
        }
    }
}

/// Total assignment of a template's placeholders to values.
///
/// Built for one (template, record) pair; every placeholder of the template is a
/// key exactly once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingResult {
    entries: BTreeMap<PlaceholderName, FieldResolution>,
}

impl MappingResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the resolution for one placeholder, replacing any earlier one
    pub fn insert(&mut self, name: PlaceholderName, resolution: FieldResolution) {
        self.entries.insert(name, resolution);
    }

    /// A mapping from plain values, e.g. a reviewer-edited file
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = (PlaceholderName, Option<String>)>,
    {
        let mut result = Self::new();
        for (name, value) in values {
            let resolution = match value {
                Some(v) => FieldResolution::resolved(v, MappingSource::Manual),
                None => FieldResolution::unmapped(UnmappedReason::NoMatch),
            };
            result.insert(name, resolution);
        }
        result
    }

    pub fn get(&self, name: &PlaceholderName) -> Option<&FieldResolution> {
        self.entries.get(name)
    }

    /// Replacement text for `name`; `None` when unmapped or unknown
    pub fn value_for(&self, name: &PlaceholderName) -> Option<&str> {
        self.entries.get(name).and_then(|r| r.value.as_str())
    }

    pub fn contains(&self, name: &PlaceholderName) -> bool {
        self.entries.contains_key(name)
    }

    /// Placeholder names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &PlaceholderName> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PlaceholderName, &FieldResolution)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn mapped_count(&self) -> usize {
        self.entries.values().filter(|r| !r.value.is_unmapped()).count()
    }

    /// Placeholders left unmapped, sorted
    pub fn unmapped(&self) -> Vec<&PlaceholderName> {
        self.entries
            .iter()
            .filter(|(_, r)| r.value.is_unmapped())
            .map(|(name, _)| name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> PlaceholderName {
        PlaceholderName::new(s).unwrap()
    }

    #[test]
    fn test_blank_value_is_unmapped() {
        assert!(MappedValue::filled("").is_unmapped());
        assert!(MappedValue::filled(" \n\t").is_unmapped());
    }

    #[test]
    fn test_filled_value_is_verbatim() {
        assert_eq!(MappedValue::filled(" Houston ").as_str(), Some(" Houston "));
        assert_eq!(MappedValue::filled("Line 1\nLine 2").as_str(), Some("Line 1\nLine 2"));
        let r = FieldResolution::resolved("  12 Elm St", MappingSource::Direct { key: "address_street".into() });
        assert_eq!(r.value.as_str(), Some("  12 Elm St"));
    }

    #[test]
    fn test_resolved_blank_falls_back_to_none_source() {
        let r = FieldResolution::resolved("  ", MappingSource::Direct { key: "x".into() });
        assert!(r.value.is_unmapped());
        assert_eq!(r.source.rule(), "none");
    }

    #[test]
    fn test_counts_and_unmapped_list() {
        let result = MappingResult::from_values(vec![
            (name("INSURED_NAME"), Some("Richard Daly".to_string())),
            (name("DATE_LOSS"), None),
            (name("TOL_CODE"), Some(String::new())),
        ]);
        assert_eq!(result.len(), 3);
        assert_eq!(result.mapped_count(), 1);
        let unmapped: Vec<_> = result.unmapped().into_iter().map(|n| n.as_str()).collect();
        assert_eq!(unmapped, vec!["DATE_LOSS", "TOL_CODE"]);
        assert_eq!(result.value_for(&name("INSURED_NAME")), Some("Richard Daly"));
        assert_eq!(result.value_for(&name("NOT_THERE")), None);
    }

    #[test]
    fn test_source_keys() {
        let composite = MappingSource::Composite {
            family: "address".into(),
            keys: vec!["address_street".into(), "address_city".into()],
        };
        assert_eq!(composite.keys(), vec!["address_street", "address_city"]);
        assert_eq!(composite.rule(), "composite");
        assert!(MappingSource::Manual.keys().is_empty());
    }

    #[test]
    fn test_serialization_shape() {
        let mut result = MappingResult::new();
        result.insert(
            name("INSURED_H_CITY"),
            FieldResolution::resolved(
                "Houston",
                MappingSource::Fuzzy { key: "address_city".into(), score: 0.5 },
            ),
        );
        let json = serde_json::to_value(&result).unwrap();
        let entry = &json["entries"]["INSURED_H_CITY"];
        assert_eq!(entry["value"], "Houston");
        assert_eq!(entry["source"]["rule"], "fuzzy");
        assert_eq!(entry["source"]["key"], "address_city");
    }

    #[test]
    fn test_deserialized_empty_value_is_unmapped() {
        let value: MappedValue = serde_json::from_str("\"\"").unwrap();
        assert!(value.is_unmapped());
    }
}
