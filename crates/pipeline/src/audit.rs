//! Audit report written next to each filled document

use crate::Result;
use chrono::{DateTime, Utc};
use field_mapper::MappingReport;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use store::BlockFailure;
use uuid::Uuid;

/// What happened to the narrative step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeSummary {
    /// False when narratives were switched off
    pub requested: bool,
    /// Section names the model returned text for
    pub sections: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NarrativeSummary {
    pub fn skipped() -> Self {
        Self {
            requested: false,
            sections: Vec::new(),
            error: None,
        }
    }
}

/// Reviewer-facing record of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub template: String,
    /// Characters of report text sent to extraction
    pub report_chars: usize,
    pub mapping: MappingReport,
    pub narrative: NarrativeSummary,
    /// Placeholder occurrences replaced in the output
    pub substitutions: usize,
    /// Placeholders still present in the output document
    pub left_in_document: Vec<String>,
    pub block_failures: Vec<BlockFailure>,
}

impl AuditReport {
    pub fn summary(&self) -> String {
        format!(
            "{}; {} substitution(s), {} placeholder(s) left in document, {} block failure(s)",
            self.mapping.summary,
            self.substitutions,
            self.left_in_document.len(),
            self.block_failures.len()
        )
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as pretty JSON, creating parent directories
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// `out/report.docx` -> `out/report.mapping_report.json`
pub fn report_path_for(output: &Path) -> PathBuf {
    output.with_extension("mapping_report.json")
}
