//! Placeholder templates on top of the DOCX package layer

mod blocks;
mod document;
pub mod reconcile;
mod sample;

pub use blocks::{Block, Paragraph, RunContent, RunFormatting, Table, TableCell, TableRow, TextRun};
pub use document::{BlockFailure, FillOutcome, PartKind, TemplateDocument};
pub use sample::sample_template;
