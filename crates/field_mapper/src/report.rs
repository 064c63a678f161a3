//! Mapping report - the reviewer-facing audit view of a mapping result

use doc_model::{MappingResult, MappingSource, UnmappedReason};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How one placeholder was resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldReport {
    /// `direct`, `fuzzy`, `composite`, `manual` or `none`
    pub rule: String,
    /// Record keys the value came from
    pub keys: Vec<String>,
    /// The literal replacement, `None` when unmapped
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composite: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<UnmappedReason>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingReport {
    pub total_placeholders: usize,
    pub mapped_count: usize,
    /// Unmapped placeholder names, sorted
    pub unmapped: Vec<String>,
    /// Count of placeholders per rule
    pub by_rule: BTreeMap<String, usize>,
    /// Per-placeholder detail, keyed by placeholder name
    pub fields: BTreeMap<String, FieldReport>,
    pub summary: String,
}

impl MappingReport {
    pub fn is_complete(&self) -> bool {
        self.unmapped.is_empty()
    }
}

/// Derive the report purely from a mapping result and its recorded sources.
pub fn mapping_report(result: &MappingResult) -> MappingReport {
    let mut fields = BTreeMap::new();
    let mut by_rule: BTreeMap<String, usize> = BTreeMap::new();
    let mut unmapped = Vec::new();

    for (name, resolution) in result.iter() {
        let rule = resolution.source.rule().to_string();
        *by_rule.entry(rule.clone()).or_default() += 1;
        if resolution.value.is_unmapped() {
            unmapped.push(name.as_str().to_string());
        }

        let (score, composite, reason) = match &resolution.source {
            MappingSource::Fuzzy { score, .. } => (Some(*score), None, None),
            MappingSource::Composite { family, .. } => (None, Some(family.clone()), None),
            MappingSource::None { reason } => (None, None, Some(*reason)),
            MappingSource::Direct { .. } | MappingSource::Manual => (None, None, None),
        };

        fields.insert(
            name.as_str().to_string(),
            FieldReport {
                rule,
                keys: resolution.source.keys().into_iter().map(str::to_string).collect(),
                value: resolution.value.as_str().map(str::to_string),
                score,
                composite,
                reason,
            },
        );
    }

    let total = result.len();
    let mapped = result.mapped_count();
    MappingReport {
        total_placeholders: total,
        mapped_count: mapped,
        summary: format!(
            "Mapped {} of {} placeholders ({} unmapped)",
            mapped,
            total,
            unmapped.len()
        ),
        unmapped,
        by_rule,
        fields,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::{FieldResolution, PlaceholderName};

    fn name(s: &str) -> PlaceholderName {
        PlaceholderName::new(s).unwrap()
    }

    fn sample() -> MappingResult {
        let mut result = MappingResult::new();
        result.insert(
            name("INSURED_NAME"),
            FieldResolution::resolved("Richard Daly", MappingSource::Direct { key: "insured_name".into() }),
        );
        result.insert(
            name("INSURED_H_CITY"),
            FieldResolution::resolved(
                "Houston",
                MappingSource::Fuzzy { key: "address_city".into(), score: 0.5 },
            ),
        );
        result.insert(name("DATE_RECEIVED"), FieldResolution::unmapped(UnmappedReason::NotSourced));
        result
    }

    #[test]
    fn test_counts_and_summary() {
        let report = mapping_report(&sample());
        assert_eq!(report.total_placeholders, 3);
        assert_eq!(report.mapped_count, 2);
        assert_eq!(report.unmapped, vec!["DATE_RECEIVED"]);
        assert_eq!(report.summary, "Mapped 2 of 3 placeholders (1 unmapped)");
        assert_eq!(report.by_rule.get("direct"), Some(&1));
        assert!(!report.is_complete());
    }

    #[test]
    fn test_field_detail() {
        let report = mapping_report(&sample());
        let city = &report.fields["INSURED_H_CITY"];
        assert_eq!(city.rule, "fuzzy");
        assert_eq!(city.keys, vec!["address_city"]);
        assert_eq!(city.value.as_deref(), Some("Houston"));
        assert_eq!(city.score, Some(0.5));
        assert_eq!(report.fields["DATE_RECEIVED"].reason, Some(UnmappedReason::NotSourced));
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(mapping_report(&sample())).unwrap();
        assert_eq!(json["fields"]["INSURED_NAME"]["rule"], "direct");
        assert!(json["fields"]["INSURED_NAME"].get("score").is_none());
        assert_eq!(json["fields"]["DATE_RECEIVED"]["value"], serde_json::Value::Null);
        assert_eq!(json["fields"]["DATE_RECEIVED"]["reason"], "not_sourced");
    }
}
