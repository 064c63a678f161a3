//! Error types for pipeline runs

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Settings are incomplete or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] extraction::ExtractionError),

    #[error("Cannot load template: {0}")]
    Template(#[from] store::DocxError),

    #[error(transparent)]
    Store(#[from] store::StoreError),

    /// The inspection report could not be read
    #[error("Cannot read report {}: {message}", path.display())]
    ReportInput { path: PathBuf, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// True when the run could not start because of settings or credentials
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::Config(_) => true,
            Self::Extraction(err) => err.is_auth(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
