//! Error types for document model operations

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocModelError {
    #[error("Invalid placeholder name: {0:?}")]
    InvalidPlaceholder(String),
}

pub type Result<T> = std::result::Result<T, DocModelError>;
