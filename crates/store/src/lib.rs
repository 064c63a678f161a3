//! Store - DOCX template loading, filling, and saving
//!
//! Templates are ordinary Word documents with `[PLACEHOLDER]` tokens in body
//! paragraphs, table cells, headers and footers.
//!
//! # Features
//!
//! - Placeholder discovery across runs, tables (nested too), headers and footers
//! - Filling that keeps the formatting of the run a placeholder starts in
//! - Non-mutating fill: the loaded template can be filled again and again
//! - Unedited package parts written back byte for byte
//!
//! # Example
//!
//! ```rust
//! use doc_model::{MappingResult, PlaceholderName};
//! use store::{sample_template, TemplateDocument};
//!
//! let template: TemplateDocument = sample_template().unwrap();
//! let mapping = MappingResult::from_values(vec![
//!     (PlaceholderName::new("CLAIM_NUMBER").unwrap(), Some("22-114".to_string())),
//! ]);
//!
//! let outcome = template.fill(&mapping);
//! assert_eq!(outcome.replacements, 1);
//! assert!(outcome.document.plain_text().contains("Claim #: 22-114"));
//! // the template itself is untouched
//! assert!(template.plain_text().contains("[CLAIM_NUMBER]"));
//! ```

pub mod docx;
mod error;
pub mod template;

pub use docx::{DocxError, DocxResult};
pub use error::{Result, StoreError};
pub use template::{
    sample_template, Block, BlockFailure, FillOutcome, Paragraph, PartKind, RunFormatting,
    TemplateDocument,
};
