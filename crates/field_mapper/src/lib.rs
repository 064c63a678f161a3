//! Field Mapper
//!
//! Resolves the placeholders found in a template against an extracted record.
//!
//! # Features
//!
//! - Hand-curated direct table, loadable from JSON ([`DirectMappingTable`])
//! - Swappable name similarity ([`Similarity`], [`TokenOverlap`], [`EditDistance`])
//! - Composite fallbacks for address and mortgagee placeholders
//! - An audit report derived from the mapping result ([`mapping_report`])
//!
//! The mapper is conservative: a placeholder it cannot resolve confidently is
//! left unmapped rather than filled with a guess.
//!
//! # Example
//!
//! ```rust
//! use doc_model::{ExtractedRecord, PlaceholderName};
//! use field_mapper::{mapping_report, FieldMapper};
//!
//! let record = ExtractedRecord::from_fields(vec![
//!     ("insured_name", Some("Richard Daly".to_string())),
//!     ("date_of_loss", None),
//! ]);
//! let placeholders = vec![
//!     PlaceholderName::new("INSURED_NAME").unwrap(),
//!     PlaceholderName::new("DATE_LOSS").unwrap(),
//! ];
//!
//! let result = FieldMapper::default().map(&record, &placeholders);
//! let report = mapping_report(&result);
//!
//! assert_eq!(report.mapped_count, 1);
//! assert_eq!(report.unmapped, vec!["DATE_LOSS"]);
//! ```

mod composite;
mod error;
mod mapper;
mod report;
mod similarity;
mod table;

pub use composite::{Assembled, CompositeFamily};
pub use error::{FieldMapperError, Result};
pub use mapper::FieldMapper;
pub use report::{mapping_report, FieldReport, MappingReport};
pub use similarity::{EditDistance, NormalizedName, Similarity, TokenOverlap, FUZZY_THRESHOLD};
pub use table::{DirectEntry, DirectMappingTable};
