//! Report-to-document pipeline
//!
//! One run: extract a record from the report, optionally overlay narrative
//! sections, map the template's placeholders, fill a copy of the template
//! and describe what happened in an [`AuditReport`]. Runs share nothing, so
//! independent reports can be processed on separate threads.

use crate::audit::{report_path_for, AuditReport, NarrativeSummary};
use crate::config::PipelineSettings;
use crate::text::read_report_text;
use crate::Result;
use chrono::Utc;
use doc_model::{ExtractedRecord, MappingResult};
use extraction::{ExtractionContract, ExtractionSchema, GeminiClient, LlmClient};
use field_mapper::{mapping_report, FieldMapper};
use std::path::PathBuf;
use store::TemplateDocument;
use tracing::{info, warn};
use uuid::Uuid;

/// Files for one [`Pipeline::process`] call
#[derive(Debug, Clone)]
pub struct FillRequest {
    pub template: PathBuf,
    pub report: PathBuf,
    pub output: PathBuf,
    /// Where to write the audit JSON; `None` skips it
    pub audit_path: Option<PathBuf>,
}

impl FillRequest {
    /// Request with the audit report next to the output
    pub fn new(template: impl Into<PathBuf>, report: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        let output = output.into();
        Self {
            template: template.into(),
            report: report.into(),
            audit_path: Some(report_path_for(&output)),
            output,
        }
    }

    pub fn with_audit_path(mut self, path: Option<PathBuf>) -> Self {
        self.audit_path = path;
        self
    }
}

/// Everything a run produced
#[derive(Debug)]
pub struct PipelineOutput {
    pub document: TemplateDocument,
    /// Extracted record with narrative sections overlaid
    pub record: ExtractedRecord,
    pub mapping: MappingResult,
    pub audit: AuditReport,
}

pub struct Pipeline<C> {
    contract: ExtractionContract<C>,
    schema: ExtractionSchema,
    mapper: FieldMapper,
    narratives_enabled: bool,
}

impl Pipeline<GeminiClient> {
    /// Validate settings and build a Gemini-backed pipeline
    pub fn from_settings(settings: &PipelineSettings) -> Result<Self> {
        settings.validate()?;
        let contract = ExtractionContract::gemini(settings.model_config()?)?;
        Ok(Self::new(contract).with_narratives(settings.narratives_enabled))
    }
}

impl<C: LlmClient> Pipeline<C> {
    /// Pipeline with the insurance schema and the default mapping table
    pub fn new(contract: ExtractionContract<C>) -> Self {
        let schema = ExtractionSchema::insurance_report();
        let mapper = FieldMapper::default().with_key_order(schema.keys());
        Self {
            contract,
            schema,
            mapper,
            narratives_enabled: true,
        }
    }

    /// Extract against `schema`; fuzzy ties then follow its key order
    pub fn with_schema(self, schema: ExtractionSchema) -> Self {
        let mapper = self.mapper.with_key_order(schema.keys());
        Self { schema, mapper, ..self }
    }

    /// Use `mapper` as given, including its key order
    pub fn with_mapper(mut self, mapper: FieldMapper) -> Self {
        self.mapper = mapper;
        self
    }

    pub fn with_narratives(mut self, enabled: bool) -> Self {
        self.narratives_enabled = enabled;
        self
    }

    pub fn contract(&self) -> &ExtractionContract<C> {
        &self.contract
    }

    /// Run against an already loaded template. Only extraction failures
    /// abort; narrative failures and unfillable blocks end up in the audit.
    pub fn run(&self, report_text: &str, template: &TemplateDocument, template_label: &str) -> Result<PipelineOutput> {
        let run_id = Uuid::new_v4();
        info!(%run_id, template = template_label, "Starting pipeline run");

        let extracted = self.contract.extract(report_text, &self.schema)?;

        let (record, narrative) = if self.narratives_enabled {
            let result = self.contract.generate_narrative(&extracted, &template.plain_text());
            let summary = NarrativeSummary {
                requested: true,
                sections: result.sections.keys().cloned().collect(),
                error: result.error.as_ref().map(|e| e.to_string()),
            };
            (extracted.with_overlay(result.iter()), summary)
        } else {
            (extracted, NarrativeSummary::skipped())
        };

        let placeholders = template.discover();
        let mapping = self.mapper.map(&record, &placeholders);
        let report = mapping_report(&mapping);
        if !report.is_complete() {
            warn!(unmapped = ?report.unmapped, "Some placeholders have no value");
        }

        let outcome = template.fill(&mapping);
        let left_in_document = outcome
            .document
            .discover()
            .into_iter()
            .map(|name| name.as_str().to_string())
            .collect();

        let audit = AuditReport {
            run_id,
            generated_at: Utc::now(),
            template: template_label.to_string(),
            report_chars: report_text.chars().count(),
            mapping: report,
            narrative,
            substitutions: outcome.replacements,
            left_in_document,
            block_failures: outcome.failures,
        };
        info!(%run_id, "{}", audit.summary());

        Ok(PipelineOutput {
            document: outcome.document,
            record,
            mapping,
            audit,
        })
    }

    /// Load the template, read the report, run, then write the filled
    /// document and the audit report. The template is loaded first so a bad
    /// template fails before any model call; nothing is written on failure.
    pub fn process(&self, request: &FillRequest) -> Result<PipelineOutput> {
        let template = TemplateDocument::load(&request.template)?;
        let report_text = read_report_text(&request.report)?;

        let label = request.template.display().to_string();
        let output = self.run(&report_text, &template, &label)?;

        output.document.save(&request.output)?;
        if let Some(audit_path) = &request.audit_path {
            output.audit.write(audit_path)?;
            info!(path = %audit_path.display(), "Wrote audit report");
        }
        Ok(output)
    }
}
