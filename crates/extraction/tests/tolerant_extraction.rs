use extraction::{ExtractionContract, ExtractionError, ExtractionSchema, MockLlmClient};

const REPORT: &str = "PHOTO REPORT\nInsured: Richard Daly\nClaim #: 22-114\nCity: Houston, TX 77002";

const OBJECT: &str = r#"{
  "insured_name": "Richard Daly",
  "claim_number": "22-114",
  "address_city": "Houston",
  "address_state": "TX",
  "address_zip": 77002,
  "date_of_loss": null
}"#;

fn extract_with(response: &str) -> doc_model::ExtractedRecord {
    ExtractionContract::new(MockLlmClient::new(response))
        .extract(REPORT, &ExtractionSchema::insurance_report())
        .unwrap()
}

#[test]
fn fenced_and_bare_responses_parse_identically() {
    let bare = extract_with(OBJECT);
    let fenced = extract_with(&format!("```json\n{}\n```", OBJECT));
    assert_eq!(bare, fenced);
    assert_eq!(bare.get("address_zip"), Some("77002"));
}

#[test]
fn prose_response_recovers_quoted_pairs_only() {
    let record = extract_with(
        r#"The insured appears to be listed as "insured_name": "John Smith" but I am unsure about the rest."#,
    );
    assert_eq!(record.get("insured_name"), Some("John Smith"));
    assert_eq!(record.populated_count(), 1);
    assert_eq!(record.len(), ExtractionSchema::insurance_report().len());
}

#[test]
fn auth_failure_is_an_error_not_an_empty_record() {
    let contract =
        ExtractionContract::new(MockLlmClient::failing(|| ExtractionError::Auth { status: 401 }));
    let result = contract.extract(REPORT, &ExtractionSchema::insurance_report());
    assert!(matches!(result, Err(ref e) if e.is_auth()));
}

#[test]
fn narrative_overlay_enriches_record_without_touching_original() {
    let contract = ExtractionContract::new(
        MockLlmClient::new(r#"{"roof_details": "Three-tab asphalt shingles in fair condition."}"#)
            .then(OBJECT),
    );
    let record = contract
        .extract(REPORT, &ExtractionSchema::insurance_report())
        .unwrap();
    let narrative = contract.generate_narrative(&record, "ROOF: [ROOF_DETAILS]");
    let enriched = record.with_overlay(narrative.iter());

    assert_eq!(contract.client().call_count(), 2);
    assert_eq!(record.get("roof_details"), None);
    assert_eq!(
        enriched.get("roof_details"),
        Some("Three-tab asphalt shingles in fair condition.")
    );
    assert_eq!(enriched.get("insured_name"), Some("Richard Daly"));
}
