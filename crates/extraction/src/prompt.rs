//! Prompt assembly for extraction and narrative calls
//!
//! Every call is stateless: the full instructions and the full input are sent
//! each time.

use crate::ExtractionSchema;
use doc_model::ExtractedRecord;

const EXTRACTION_ROLE: &str =
    "You are an insurance claims adjuster AI. Extract all relevant information from this photo report.";

const NARRATIVE_ROLE: &str = "You are an insurance claims adjuster writing a professional GLR (General Loss Report).\n\
Based on the following extracted information, generate professional narrative text for each section.";

/// Build the extraction prompt for one report.
pub fn build_extraction_prompt(report_text: &str, schema: &ExtractionSchema) -> String {
    format!(
        "{EXTRACTION_ROLE}\n\
Return ONLY a valid JSON object with exactly the following keys (use null for missing values):\n\
{skeleton}\n\
\n\
Here is the photo report text:\n\
\n\
<report>\n\
{report_text}\n\
</report>\n\
\n\
Return ONLY the JSON object, no other text.\n",
        skeleton = schema.to_json_skeleton(),
    )
}

/// Build the narrative prompt from an already-extracted record.
///
/// `template_context` is the template's plain text; an empty string omits that
/// block entirely.
pub fn build_narrative_prompt(
    record: &ExtractedRecord,
    template_context: &str,
    sections: &ExtractionSchema,
) -> String {
    let data = serde_json::to_string_pretty(record).unwrap_or_else(|_| "{}".to_string());
    let context = if template_context.trim().is_empty() {
        String::new()
    } else {
        format!("Template Context:\n<template>\n{}\n</template>\n\n", template_context.trim())
    };

    format!(
        "{NARRATIVE_ROLE}\n\
\n\
Extracted Data:\n\
{data}\n\
\n\
{context}\
Generate ONLY a valid JSON object with these narrative sections (max 2-3 sentences each):\n\
{skeleton}\n\
\n\
Return ONLY the JSON object, no other text.\n",
        skeleton = sections.to_json_skeleton(),
    )
}
