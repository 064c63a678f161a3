//! Document Model - shared types for the report-to-template pipeline
//!
//! This crate holds the data that flows between the pipeline stages:
//!
//! - [`PlaceholderName`] - a bracketed template token such as `[INSURED_NAME]`
//! - [`ExtractedRecord`] - the (possibly sparse) field values read from a report
//! - [`MappingResult`] - the total assignment of template placeholders to values
//!
//! Data flows strictly one way: a record is produced by the extraction stage,
//! turned into a mapping by the field mapper, and consumed by the template engine.

mod error;
mod mapping;
mod placeholder;
mod record;

pub use error::*;
pub use mapping::*;
pub use placeholder::*;
pub use record::*;
