//! Error types for field mapping configuration

use thiserror::Error;

/// Errors that can occur while loading mapping configuration.
///
/// Resolving placeholders never fails; only table loading does.
#[derive(Debug, Error)]
pub enum FieldMapperError {
    /// IO error reading a table file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing a JSON table
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A table entry names a field that is not `lower_snake_case`
    #[error("Invalid field name for placeholder {placeholder}: {field:?}")]
    InvalidFieldName { placeholder: String, field: String },
}

pub type Result<T> = std::result::Result<T, FieldMapperError>;
