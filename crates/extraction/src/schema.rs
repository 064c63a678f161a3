//! Extraction schemas - the keys requested from the model

use serde::{Deserialize, Serialize};

/// One expected key with a one-line description for the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub key: String,
    pub description: String,
}

/// Ordered list of expected keys.
///
/// The order is significant: it is the order keys appear in the request, the
/// order of the parsed record, and the tie-break order for fuzzy mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionSchema {
    fields: Vec<SchemaField>,
}

impl ExtractionSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a key; a key already present keeps its position and gets the new description
    pub fn with_field(mut self, key: impl Into<String>, description: impl Into<String>) -> Self {
        let key = key.into();
        let description = description.into();
        match self.fields.iter_mut().find(|f| f.key == key) {
            Some(field) => field.description = description,
            None => self.fields.push(SchemaField { key, description }),
        }
        self
    }

    /// Fields commonly found on a property inspection photo report
    pub fn insurance_report() -> Self {
        [
            ("insured_name", "name of insured/property owner"),
            ("policy_number", "policy number"),
            ("claim_number", "claim number"),
            ("mortgage_company", "mortgage company name if mentioned"),
            ("loan_number", "mortgage loan number if mentioned"),
            ("date_of_loss", "date when damage occurred"),
            ("date_inspected", "date of inspection"),
            ("risk_address", "full property address"),
            ("address_street", "street address"),
            ("address_city", "city"),
            ("address_state", "state"),
            ("address_zip", "zip code"),
            ("dwelling_type", "type of dwelling (1 story, 2 story, etc)"),
            ("roof_material", "roof shingles/material type"),
            ("roof_age", "approximate roof age in years"),
            ("roof_pitch", "roof pitch (e.g., 5/12)"),
            ("roof_condition", "description of roof condition"),
            ("front_elevation_damage", "damage description for front"),
            ("right_elevation_damage", "damage description for right side"),
            ("rear_elevation_damage", "damage description for rear"),
            ("left_elevation_damage", "damage description for left side"),
            ("interior_damage", "description of interior damage if any"),
            ("type_of_loss", "type of loss (wind, hail, etc)"),
            ("damage_summary", "brief summary of all damages"),
            ("additional_notes", "any other relevant information"),
        ]
        .into_iter()
        .fold(Self::new(), |schema, (key, desc)| schema.with_field(key, desc))
    }

    /// Prose sections of a general loss report
    pub fn narrative_sections() -> Self {
        [
            ("dwelling_description", "professional description of the dwelling and its condition"),
            ("property_condition", "assessment of general property condition and any concerns"),
            ("roof_details", "detailed description of roof materials, age, pitch, and condition"),
            ("front_elevation", "description of front elevation and any damages"),
            ("right_elevation", "description of right elevation and any damages"),
            ("rear_elevation", "description of rear elevation and any damages"),
            ("left_elevation", "description of left elevation and any damages"),
            ("interior", "description of interior and any damages"),
            ("damage_summary", "professional summary of all damages found"),
        ]
        .into_iter()
        .fold(Self::new(), |schema, (key, desc)| schema.with_field(key, desc))
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    /// Keys in declared order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.key.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.iter().any(|f| f.key == key)
    }

    /// Declared position of `key`
    pub fn position(&self, key: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.key == key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The schema as a JSON object skeleton `{"key": "description", ...}`
    pub fn to_json_skeleton(&self) -> String {
        let mut out = String::from("{\n");
        for (i, field) in self.fields.iter().enumerate() {
            let key = serde_json::Value::String(field.key.clone());
            let desc = serde_json::Value::String(field.description.clone());
            out.push_str(&format!("  {}: {}", key, desc));
            if i + 1 < self.fields.len() {
                out.push(',');
            }
            out.push('\n');
        }
        out.push('}');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insurance_schema_order() {
        let schema = ExtractionSchema::insurance_report();
        assert_eq!(schema.len(), 25);
        assert_eq!(schema.keys().next(), Some("insured_name"));
        assert_eq!(schema.keys().last(), Some("additional_notes"));
        assert!(schema.position("address_city") < schema.position("address_zip"));
    }

    #[test]
    fn test_with_field_replaces_description_in_place() {
        let schema = ExtractionSchema::new()
            .with_field("a", "first")
            .with_field("b", "second")
            .with_field("a", "updated");
        assert_eq!(schema.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(schema.fields()[0].description, "updated");
    }

    #[test]
    fn test_json_skeleton_is_valid_json() {
        let skeleton = ExtractionSchema::narrative_sections().to_json_skeleton();
        let value: serde_json::Value = serde_json::from_str(&skeleton).unwrap();
        assert_eq!(value.as_object().map(|o| o.len()), Some(9));
        assert!(value.get("roof_details").is_some());
    }
}
