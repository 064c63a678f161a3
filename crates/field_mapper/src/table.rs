//! Direct mapping table - hand-curated placeholder to field assignments

use crate::{FieldMapperError, Result};
use doc_model::PlaceholderName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Outcome of looking a placeholder up in the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectEntry<'a> {
    /// Read this record key
    Field(&'a str),
    /// The placeholder is deliberately never filled from a report
    NotSourced,
}

/// Static table from placeholder to record key.
///
/// Serialized as a JSON object `{"PLACEHOLDER": "field_name" | null}`; a null
/// entry marks a placeholder that is never sourced from the report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirectMappingTable {
    entries: BTreeMap<PlaceholderName, Option<String>>,
}

impl DirectMappingTable {
    /// A table with no entries (fuzzy and composite rules only)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Table for the standard general loss report template
    pub fn insurance_default() -> Self {
        let mut table = Self::empty();
        for (placeholder, field) in [
            ("DATE_LOSS", Some("date_of_loss")),
            ("INSURED_NAME", Some("insured_name")),
            ("MORTGAGE_CO", Some("mortgage_company")),
            ("INSURED_H_STREET", Some("address_street")),
            ("INSURED_H_CITY", Some("address_city")),
            ("INSURED_H_STATE", Some("address_state")),
            ("INSURED_H_ZIP", Some("address_zip")),
            ("DATE_INSPECTED", Some("date_inspected")),
            ("MORTGAGEE", Some("mortgage_company")),
            ("TOL_CODE", Some("type_of_loss")),
            ("DATE_RECEIVED", None),
            ("POLICY_NUMBER", Some("policy_number")),
            ("CLAIM_NUMBER", Some("claim_number")),
        ] {
            if let Ok(name) = PlaceholderName::new(placeholder) {
                table.entries.insert(name, field.map(str::to_string));
            }
        }
        table
    }

    /// Map `placeholder` to the record key `field`
    pub fn with_field(mut self, placeholder: PlaceholderName, field: impl Into<String>) -> Result<Self> {
        let field = field.into();
        validate_field(&placeholder, &field)?;
        self.entries.insert(placeholder, Some(field));
        Ok(self)
    }

    /// Declare that `placeholder` is never filled from a report
    pub fn with_not_sourced(mut self, placeholder: PlaceholderName) -> Self {
        self.entries.insert(placeholder, None);
        self
    }

    /// Parse a JSON table
    pub fn from_json_str(json: &str) -> Result<Self> {
        let table: Self = serde_json::from_str(json)?;
        for (placeholder, field) in &table.entries {
            if let Some(field) = field {
                validate_field(placeholder, field)?;
            }
        }
        Ok(table)
    }

    /// Load a JSON table from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Entries of `other` override entries of `self`
    pub fn merged_with(mut self, other: DirectMappingTable) -> Self {
        self.entries.extend(other.entries);
        self
    }

    pub fn lookup(&self, placeholder: &PlaceholderName) -> Option<DirectEntry<'_>> {
        self.entries.get(placeholder).map(|field| match field {
            Some(field) => DirectEntry::Field(field.as_str()),
            None => DirectEntry::NotSourced,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn validate_field(placeholder: &PlaceholderName, field: &str) -> Result<()> {
    let valid = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(FieldMapperError::InvalidFieldName {
            placeholder: placeholder.as_str().to_string(),
            field: field.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn name(s: &str) -> PlaceholderName {
        PlaceholderName::new(s).unwrap()
    }

    #[test]
    fn test_default_table_entries() {
        let table = DirectMappingTable::insurance_default();
        assert_eq!(table.lookup(&name("INSURED_NAME")), Some(DirectEntry::Field("insured_name")));
        assert_eq!(table.lookup(&name("MORTGAGEE")), Some(DirectEntry::Field("mortgage_company")));
        assert_eq!(table.lookup(&name("DATE_RECEIVED")), Some(DirectEntry::NotSourced));
        assert_eq!(table.lookup(&name("ROOF_AGE")), None);
    }

    #[test]
    fn test_from_json() {
        let table =
            DirectMappingTable::from_json_str(r#"{"ADJUSTER": null, "ROOF_TYPE": "roof_material"}"#).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup(&name("ADJUSTER")), Some(DirectEntry::NotSourced));
        assert_eq!(table.lookup(&name("ROOF_TYPE")), Some(DirectEntry::Field("roof_material")));
    }

    #[test]
    fn test_from_json_rejects_bad_names() {
        assert!(DirectMappingTable::from_json_str(r#"{"roof": "roof_material"}"#).is_err());
        assert!(matches!(
            DirectMappingTable::from_json_str(r#"{"ROOF": "Roof Material"}"#),
            Err(FieldMapperError::InvalidFieldName { .. })
        ));
    }

    #[test]
    fn test_from_file_and_merge() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        writeln!(file, r#"{{"TOL_CODE": "cause_of_loss"}}"#).unwrap();
        let custom = DirectMappingTable::from_file(file.path()).unwrap();
        let table = DirectMappingTable::insurance_default().merged_with(custom);
        assert_eq!(table.lookup(&name("TOL_CODE")), Some(DirectEntry::Field("cause_of_loss")));
        assert_eq!(table.lookup(&name("DATE_LOSS")), Some(DirectEntry::Field("date_of_loss")));
    }

    #[test]
    fn test_builder() {
        let table = DirectMappingTable::empty()
            .with_field(name("ROOF"), "roof_material")
            .unwrap()
            .with_not_sourced(name("DATE_RECEIVED"));
        assert_eq!(table.len(), 2);
        assert!(DirectMappingTable::empty().with_field(name("ROOF"), "").is_err());
    }
}
