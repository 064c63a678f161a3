//! GLR pipeline
//!
//! Turns an inspection report into a filled `.docx` report template:
//! extraction ([`extraction`]), placeholder mapping ([`field_mapper`]) and
//! template filling ([`store`]), plus settings and an audit trail.
//!
//! # Example
//!
//! ```rust
//! use extraction::{ExtractionContract, MockLlmClient};
//! use pipeline::Pipeline;
//! use store::sample_template;
//!
//! let client = MockLlmClient::new(r#"{"insured_name": "Richard Daly", "claim_number": "22-114"}"#);
//! let pipeline = Pipeline::new(ExtractionContract::new(client)).with_narratives(false);
//!
//! let template = sample_template().unwrap();
//! let output = pipeline.run("Insured: Richard Daly", &template, "sample").unwrap();
//!
//! assert!(output.document.plain_text().contains("Claim #: 22-114"));
//! assert_eq!(output.audit.substitutions, 2);
//! ```

mod audit;
mod config;
mod error;
mod pipeline;
mod text;

pub use audit::{report_path_for, AuditReport, NarrativeSummary};
pub use config::{
    ModelSettings, PipelineSettings, ENV_API_KEY, ENV_ENDPOINT, ENV_MODEL, ENV_TIMEOUT_SECS,
};
pub use error::{PipelineError, Result};
pub use pipeline::{FillRequest, Pipeline, PipelineOutput};
pub use text::read_report_text;
