//! Pipeline settings
//!
//! Settings come from three layers, later layers winning: built-in defaults,
//! an optional JSON settings file, then environment variables.

use crate::{PipelineError, Result};
use extraction::{ModelConfig, DEFAULT_ENDPOINT, DEFAULT_MODEL};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Environment variable holding the model API key
pub const ENV_API_KEY: &str = "GOOGLE_API_KEY";
pub const ENV_MODEL: &str = "GLR_MODEL";
pub const ENV_ENDPOINT: &str = "GLR_ENDPOINT";
pub const ENV_TIMEOUT_SECS: &str = "GLR_TIMEOUT_SECS";

/// Top-level pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineSettings {
    /// Generative model access
    pub model: ModelSettings,
    /// Ask the model for narrative sections after extraction
    pub narratives_enabled: bool,
    /// Write `<output>.mapping_report.json` next to each filled document
    pub write_report: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            model: ModelSettings::default(),
            narratives_enabled: true,
            write_report: true,
        }
    }
}

/// Model settings
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelSettings {
    pub model_name: String,
    /// API base URL, without the `/models/...` suffix
    pub endpoint: String,
    /// Per-request timeout; `None` leaves the call unbounded
    pub request_timeout_secs: Option<u64>,
    /// Never written back out
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout_secs: None,
            api_key: None,
        }
    }
}

impl fmt::Debug for ModelSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSettings")
            .field("model_name", &self.model_name)
            .field("endpoint", &self.endpoint)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl PipelineSettings {
    /// Defaults, then `path` if given, then the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_env();
        Ok(settings)
    }

    /// Read a JSON settings file. A missing file yields defaults; a file
    /// that does not parse is reported and ignored.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        match serde_json::from_str::<PipelineSettings>(&content) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                warn!("Failed to parse settings file, using defaults: {}", e);
                Ok(Self::default())
            }
        }
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from any variable source
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_API_KEY) {
            self.model.api_key = Some(key);
        }
        if let Some(model) = lookup(ENV_MODEL).filter(|v| !v.trim().is_empty()) {
            self.model.model_name = model.trim().to_string();
        }
        if let Some(endpoint) = lookup(ENV_ENDPOINT).filter(|v| !v.trim().is_empty()) {
            self.model.endpoint = endpoint.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(secs) => self.model.request_timeout_secs = Some(secs),
                Err(_) => warn!(value = %raw, "Ignoring {} that is not a whole number", ENV_TIMEOUT_SECS),
            }
        }
    }

    /// Check everything needed before any file is read or request is sent
    pub fn validate(&self) -> Result<()> {
        match &self.model.api_key {
            Some(key) if !key.trim().is_empty() => {}
            _ => {
                return Err(PipelineError::Config(format!(
                    "{} is not set; the extraction model needs an API key",
                    ENV_API_KEY
                )));
            }
        }
        if self.model.model_name.trim().is_empty() {
            return Err(PipelineError::Config("model_name is empty".to_string()));
        }
        if !self.model.endpoint.starts_with("http://") && !self.model.endpoint.starts_with("https://") {
            return Err(PipelineError::Config(format!(
                "endpoint must be an http(s) URL, got {:?}",
                self.model.endpoint
            )));
        }
        if self.model.request_timeout_secs == Some(0) {
            return Err(PipelineError::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Model configuration for the extraction contract
    pub fn model_config(&self) -> Result<ModelConfig> {
        self.validate()?;
        let key = self.model.api_key.clone().unwrap_or_default();
        Ok(ModelConfig::new(key)?
            .with_model(self.model.model_name.clone())
            .with_endpoint(self.model.endpoint.clone())
            .with_timeout(self.model.request_timeout_secs.map(Duration::from_secs)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_settings() {
        let settings = PipelineSettings::default();
        assert_eq!(settings.model.model_name, DEFAULT_MODEL);
        assert_eq!(settings.model.request_timeout_secs, None);
        assert!(settings.narratives_enabled);
        assert!(settings.write_report);
    }

    #[test]
    fn test_api_key_is_never_serialized() {
        let mut settings = PipelineSettings::default();
        settings.model.api_key = Some("secret-key".to_string());
        let json = serde_json::to_string(&settings).unwrap();
        assert!(!json.contains("secret-key"));
        assert!(!format!("{:?}", settings).contains("secret-key"));
    }

    #[test]
    fn test_file_then_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"model": {"model_name": "gemini-1.5-pro", "request_timeout_secs": 30}, "write_report": false}"#,
        )
        .unwrap();

        let mut settings = PipelineSettings::from_file(&path).unwrap();
        assert_eq!(settings.model.model_name, "gemini-1.5-pro");
        assert_eq!(settings.model.endpoint, DEFAULT_ENDPOINT);
        assert!(!settings.write_report);
        assert!(settings.narratives_enabled);

        settings.apply_overrides(env(&[(ENV_MODEL, "gemini-2.0-flash"), (ENV_API_KEY, "k")]));
        assert_eq!(settings.model.model_name, "gemini-2.0-flash");
        assert_eq!(settings.model.request_timeout_secs, Some(30));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(PipelineSettings::from_file(&path).unwrap(), PipelineSettings::default());
        assert_eq!(
            PipelineSettings::from_file(&dir.path().join("missing.json")).unwrap(),
            PipelineSettings::default()
        );
    }

    #[test]
    fn test_validate_rejects_missing_or_blank_key() {
        let mut settings = PipelineSettings::default();
        assert!(matches!(settings.validate(), Err(PipelineError::Config(_))));

        settings.apply_overrides(env(&[(ENV_API_KEY, "   ")]));
        assert!(matches!(settings.validate(), Err(PipelineError::Config(_))));
        assert!(settings.model_config().is_err());
    }

    #[test]
    fn test_bad_timeout_is_ignored_and_zero_rejected() {
        let mut settings = PipelineSettings::default();
        settings.apply_overrides(env(&[(ENV_TIMEOUT_SECS, "soon"), (ENV_API_KEY, "k")]));
        assert_eq!(settings.model.request_timeout_secs, None);

        settings.apply_overrides(env(&[(ENV_TIMEOUT_SECS, "0")]));
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_model_config() {
        let mut settings = PipelineSettings::default();
        settings.apply_overrides(env(&[(ENV_API_KEY, "k"), (ENV_TIMEOUT_SECS, "45")]));
        let config = settings.model_config().unwrap();
        assert_eq!(config.model_name, DEFAULT_MODEL);
        assert_eq!(config.timeout, Some(Duration::from_secs(45)));
    }
}
