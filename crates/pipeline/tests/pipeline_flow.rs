use extraction::{ExtractionContract, ExtractionError, MockLlmClient};
use pipeline::{report_path_for, FillRequest, Pipeline, PipelineError};
use std::path::Path;
use store::{sample_template, TemplateDocument};

const EXTRACTION: &str = r#"Sure! Here is the data:
```json
{
  "insured_name": "Richard Daly",
  "policy_number": "HO-443210",
  "claim_number": "22-114",
  "date_inspected": "2024-03-05",
  "address_street": "12 Elm St",
  "address_city": "Houston",
  "address_state": "TX",
  "address_zip": "77002",
  "type_of_loss": "Hail",
  "damage_summary": "hail",
  "roof_material": "Asphalt shingles"
}
```"#;

const NARRATIVE: &str = r#"{
  "roof_details": "Two-layer asphalt shingle roof, roughly 12 years old.",
  "front_elevation": "Dented gutters and split siding on the front.",
  "interior": "No interior damage observed.",
  "damage_summary": "Hail damage to roof covering and front elevation."
}"#;

fn setup(dir: &Path) -> FillRequest {
    let template = dir.join("template.docx");
    sample_template().unwrap().save(&template).unwrap();
    let report = dir.join("report.txt");
    std::fs::write(&report, "Inspection of 12 Elm St, Houston TX for Richard Daly.").unwrap();
    FillRequest::new(template, report, dir.join("out").join("filled.docx"))
}

#[test]
fn fills_template_and_writes_audit_report() {
    let dir = tempfile::tempdir().unwrap();
    let request = setup(dir.path());
    let pipeline = Pipeline::new(ExtractionContract::new(MockLlmClient::new(NARRATIVE).then(EXTRACTION)));

    let output = pipeline.process(&request).unwrap();

    assert_eq!(pipeline.contract().client().call_count(), 2);
    assert!(output.audit.left_in_document.is_empty(), "{:?}", output.audit.left_in_document);
    assert!(output.audit.block_failures.is_empty());

    let written = TemplateDocument::load(&request.output).unwrap();
    let text = written.plain_text();
    assert!(text.contains("Insured: Richard Daly"));
    assert!(text.contains("Claim #: 22-114"));
    assert!(text.contains("Address: 12 Elm St, Houston, TX 77002"));
    assert!(text.contains("Roof | Two-layer asphalt shingle roof, roughly 12 years old."));
    // narrative sections replace same-named extracted values
    assert!(text.contains("Hail damage to roof covering and front elevation."));

    let audit_path = report_path_for(&request.output);
    let audit: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(audit_path).unwrap()).unwrap();
    assert_eq!(audit["mapping"]["fields"]["INSURED_NAME"]["rule"], "direct");
    assert_eq!(audit["mapping"]["fields"]["ROOF_DETAILS"]["rule"], "fuzzy");
    assert_eq!(audit["narrative"]["requested"], true);
    assert_eq!(audit["substitutions"], 13);
}

#[test]
fn narrative_failure_is_recorded_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let request = setup(dir.path());
    let client = MockLlmClient::failing(|| ExtractionError::Http("timed out".into())).then(EXTRACTION);
    let pipeline = Pipeline::new(ExtractionContract::new(client));

    let output = pipeline.process(&request).unwrap();

    assert!(request.output.exists());
    assert!(output.audit.narrative.sections.is_empty());
    assert!(output.audit.narrative.error.as_deref().unwrap().contains("timed out"));
    // extracted damage summary is used when no narrative arrives
    assert!(output.document.plain_text().contains("Damage Summary:\n\nhail"));
    assert!(output
        .audit
        .left_in_document
        .contains(&"ROOF_DETAILS".to_string()));
}

#[test]
fn extraction_failure_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let request = setup(dir.path());
    let pipeline = Pipeline::new(ExtractionContract::new(MockLlmClient::failing(|| {
        ExtractionError::Auth { status: 403 }
    })));

    let err = pipeline.process(&request).unwrap_err();

    assert!(matches!(err, PipelineError::Extraction(ExtractionError::Auth { status: 403 })));
    assert!(err.is_configuration());
    assert!(!request.output.exists());
    assert!(!report_path_for(&request.output).exists());
}

#[test]
fn bad_template_fails_before_any_model_call() {
    let dir = tempfile::tempdir().unwrap();
    let mut request = setup(dir.path());
    std::fs::write(&request.template, b"definitely not a docx").unwrap();
    request = request.with_audit_path(None);
    let pipeline = Pipeline::new(ExtractionContract::new(MockLlmClient::new(EXTRACTION)));

    let err = pipeline.process(&request).unwrap_err();

    assert!(matches!(err, PipelineError::Template(_)));
    assert_eq!(pipeline.contract().client().call_count(), 0);
    assert!(!request.output.exists());
}

#[test]
fn prose_reply_still_produces_a_document() {
    let template = sample_template().unwrap();
    let client = MockLlmClient::new(r#"I found "insured_name": "Richard Daly" and "claim_number": "22-114" in the report."#);
    let pipeline = Pipeline::new(ExtractionContract::new(client)).with_narratives(false);

    let output = pipeline.run("report", &template, "sample").unwrap();

    assert_eq!(pipeline.contract().client().call_count(), 1);
    assert_eq!(output.record.get("insured_name"), Some("Richard Daly"));
    assert_eq!(output.audit.substitutions, 2);
    assert!(!output.audit.narrative.requested);
    assert!(template.plain_text().contains("[INSURED_NAME]"));
}
