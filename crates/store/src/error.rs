//! Error types for template storage operations

use crate::docx::DocxError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The template could not be read or the package could not be built
    #[error("Template error: {0}")]
    Docx(#[from] DocxError),

    /// The finished document could not be written to disk
    #[error("Failed to write {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, StoreError>;
