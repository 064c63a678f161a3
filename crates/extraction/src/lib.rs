//! Extraction Contract
//!
//! Converts free-form inspection report text into an [`ExtractedRecord`] using a
//! generative model, tolerating responses that are not well-formed JSON.
//!
//! # Features
//!
//! - Ordered extraction schemas ([`ExtractionSchema::insurance_report`])
//! - A single-method model capability ([`LlmClient`]) with a Gemini HTTP client
//!   and a canned [`MockLlmClient`]
//! - A pure, never-failing response parser ([`parse_response`])
//! - Narrative section generation whose failure is reported, not raised
//!
//! # Example
//!
//! ```rust
//! use extraction::{ExtractionContract, ExtractionSchema, MockLlmClient};
//!
//! let client = MockLlmClient::new(
//!     r#"Here it is: {"insured_name": "Richard Daly", "date_of_loss": null}"#,
//! );
//! let contract = ExtractionContract::new(client);
//! let record = contract
//!     .extract("Insured: Richard Daly", &ExtractionSchema::insurance_report())
//!     .unwrap();
//!
//! assert_eq!(record.get("insured_name"), Some("Richard Daly"));
//! assert_eq!(record.get("date_of_loss"), None);
//! ```
//!
//! [`ExtractedRecord`]: doc_model::ExtractedRecord

mod client;
mod contract;
mod error;
mod mock;
mod parser;
mod schema;
pub mod prompt;

pub use client::{GeminiClient, LlmClient, ModelConfig, DEFAULT_ENDPOINT, DEFAULT_MODEL};
pub use contract::{ExtractionContract, NarrativeResult};
pub use error::{ExtractionError, Result};
pub use mock::MockLlmClient;
pub use parser::{parse_response, parse_response_with_stage, ParseStage};
pub use schema::{ExtractionSchema, SchemaField};
