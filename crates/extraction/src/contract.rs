//! Extraction contract - one stateless model call per operation

use crate::parser::{parse_response_with_stage, ParseStage};
use crate::prompt::{build_extraction_prompt, build_narrative_prompt};
use crate::{ExtractionError, ExtractionSchema, GeminiClient, LlmClient, ModelConfig, Result};
use doc_model::ExtractedRecord;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Narrative sections produced by [`ExtractionContract::generate_narrative`].
///
/// A failed call leaves `sections` empty and keeps the error so the caller can
/// report it; it never aborts the run.
#[derive(Debug, Default)]
pub struct NarrativeResult {
    pub sections: BTreeMap<String, String>,
    pub error: Option<ExtractionError>,
}

impl NarrativeResult {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// `(section, text)` pairs, suitable for [`ExtractedRecord::with_overlay`]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sections.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

pub struct ExtractionContract<C> {
    client: C,
    narrative_sections: ExtractionSchema,
}

impl ExtractionContract<GeminiClient> {
    /// Contract backed by the Gemini HTTP client
    pub fn gemini(config: ModelConfig) -> Result<Self> {
        Ok(Self::new(GeminiClient::new(config)?))
    }
}

impl<C: LlmClient> ExtractionContract<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            narrative_sections: ExtractionSchema::narrative_sections(),
        }
    }

    pub fn with_narrative_sections(mut self, sections: ExtractionSchema) -> Self {
        self.narrative_sections = sections;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn narrative_sections(&self) -> &ExtractionSchema {
        &self.narrative_sections
    }

    /// Turn report text into a record with every schema key present.
    ///
    /// Exactly one model call, even for empty text. Transport and auth
    /// failures are returned as errors; a malformed response is not.
    pub fn extract(&self, report_text: &str, schema: &ExtractionSchema) -> Result<ExtractedRecord> {
        if report_text.trim().is_empty() {
            warn!("Report text is empty; the model will see an empty report");
        }
        let prompt = build_extraction_prompt(report_text, schema);
        let raw = self.client.generate_structured(&prompt, schema)?;
        let (record, stage) = parse_response_with_stage(&raw, schema);
        info!(
            populated = record.populated_count(),
            expected = schema.len(),
            fallback = stage == ParseStage::Fallback,
            "Extraction complete"
        );
        Ok(record)
    }

    /// Ask the model for prose sections based on an extracted record.
    pub fn generate_narrative(&self, record: &ExtractedRecord, template_context: &str) -> NarrativeResult {
        let prompt = build_narrative_prompt(record, template_context, &self.narrative_sections);
        match self.client.generate_structured(&prompt, &self.narrative_sections) {
            Ok(raw) => {
                let (parsed, _) = parse_response_with_stage(&raw, &self.narrative_sections);
                let sections: BTreeMap<String, String> = parsed
                    .populated()
                    .filter(|(key, _)| self.narrative_sections.contains(key))
                    .map(|(key, text)| (key.to_string(), text.to_string()))
                    .collect();
                info!(sections = sections.len(), "Narrative generation complete");
                NarrativeResult { sections, error: None }
            }
            Err(err) => {
                warn!(error = %err, "Narrative generation failed, continuing without narratives");
                NarrativeResult { sections: BTreeMap::new(), error: Some(err) }
            }
        }
    }
}
