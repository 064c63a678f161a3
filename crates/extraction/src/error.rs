//! Error types for the extraction contract
//!
//! Only transport, authentication and configuration problems are errors here.
//! A response that is not well-formed JSON is handled by the tolerant parser.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The model endpoint could not be reached
    #[error("Cannot reach model endpoint at {0}")]
    Connection(String),

    /// Transport failure other than connect (timeout, TLS, body read)
    #[error("HTTP client error: {0}")]
    Http(String),

    /// The endpoint rejected the credential
    #[error("Model endpoint rejected the API key (HTTP {status})")]
    Auth { status: u16 },

    /// Non-success status other than an auth failure
    #[error("Model API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    /// The HTTP envelope did not carry any generated text
    #[error("Unexpected model response: {0}")]
    ResponseFormat(String),

    /// No usable API key was configured
    #[error("API key is missing or empty")]
    MissingApiKey,
}

impl ExtractionError {
    /// True for credential problems, which retrying will not fix
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. } | Self::MissingApiKey)
    }
}

pub type Result<T> = std::result::Result<T, ExtractionError>;
