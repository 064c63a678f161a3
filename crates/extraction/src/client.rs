//! Generative model capability and its Gemini HTTP implementation

use crate::{ExtractionError, ExtractionSchema, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// Default Generative Language API base URL
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// The one capability the extraction contract needs from a model:
/// send a prompt, get raw text back.
///
/// Implementations make exactly one request per call and keep no state between
/// calls. They must not retry.
pub trait LlmClient {
    fn generate_structured(&self, prompt: &str, schema: &ExtractionSchema) -> Result<String>;
}

impl<T: LlmClient + ?Sized> LlmClient for &T {
    fn generate_structured(&self, prompt: &str, schema: &ExtractionSchema) -> Result<String> {
        (**self).generate_structured(prompt, schema)
    }
}

impl<T: LlmClient + ?Sized> LlmClient for Box<T> {
    fn generate_structured(&self, prompt: &str, schema: &ExtractionSchema) -> Result<String> {
        (**self).generate_structured(prompt, schema)
    }
}

/// Connection settings for the model, passed in explicitly by the caller
#[derive(Clone)]
pub struct ModelConfig {
    api_key: String,
    pub model_name: String,
    pub endpoint: String,
    /// `None` means the client applies no timeout of its own
    pub timeout: Option<Duration>,
}

impl ModelConfig {
    /// Validate the key and build a config with default model and endpoint
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into().trim().to_string();
        if api_key.is_empty() {
            return Err(ExtractionError::MissingApiKey);
        }
        Ok(Self {
            api_key,
            model_name: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: None,
        })
    }

    pub fn with_model(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full `generateContent` URL for the configured model
    pub fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            urlencoding::encode(&self.model_name)
        )
    }
}

impl fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelConfig")
            .field("api_key", &"<redacted>")
            .field("model_name", &self.model_name)
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Gemini `generateContent` client (blocking)
pub struct GeminiClient {
    config: ModelConfig,
    client: reqwest::blocking::Client,
}

impl GeminiClient {
    pub fn new(config: ModelConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ExtractionError::Http(e.to_string()))?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// OpenAPI-style object schema with one nullable string per key
fn response_schema(schema: &ExtractionSchema) -> Option<serde_json::Value> {
    if schema.is_empty() {
        return None;
    }
    let properties: serde_json::Map<String, serde_json::Value> = schema
        .fields()
        .iter()
        .map(|f| {
            (
                f.key.clone(),
                serde_json::json!({
                    "type": "STRING",
                    "nullable": true,
                    "description": f.description,
                }),
            )
        })
        .collect();
    Some(serde_json::json!({
        "type": "OBJECT",
        "properties": properties,
        "propertyOrdering": schema.keys().collect::<Vec<_>>(),
    }))
}

impl LlmClient for GeminiClient {
    fn generate_structured(&self, prompt: &str, schema: &ExtractionSchema) -> Result<String> {
        let url = self.config.generate_url();
        let body = GenerateRequest {
            contents: vec![Content { role: "user", parts: vec![Part { text: prompt }] }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: response_schema(schema),
            },
        };

        debug!(model = %self.config.model_name, prompt_len = prompt.len(), "Sending generateContent request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.config.api_key.as_str())
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    ExtractionError::Connection(self.config.endpoint.clone())
                } else if e.is_timeout() {
                    ExtractionError::Http(match self.config.timeout {
                        Some(t) => format!("Request timed out after {}s", t.as_secs()),
                        None => "Request timed out".to_string(),
                    })
                } else {
                    ExtractionError::Http(e.without_url().to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(classify_status(status.as_u16(), body));
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| ExtractionError::ResponseFormat(e.without_url().to_string()))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            warn!("Model returned no candidate text");
        }
        Ok(text)
    }
}

/// Map a non-success HTTP status to an error category
fn classify_status(status: u16, body: String) -> ExtractionError {
    // Google reports a malformed key as 400 with this reason code
    if status == 401 || status == 403 || (status == 400 && body.contains("API_KEY_INVALID")) {
        ExtractionError::Auth { status }
    } else {
        ExtractionError::Api { status, body }
    }
}
