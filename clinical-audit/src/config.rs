use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::{AuditError, AuditResult};

/// 50 MiB, the largest audio upload the gateway accepts.
pub const DEFAULT_MAX_AUDIO_BYTES: usize = 50 * 1024 * 1024;
pub const DEFAULT_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_ORACLE_URL: &str = "https://generativelanguage.googleapis.com";
/// Low temperature keeps the audit analytical rather than creative.
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Which backend the orchestrator analyzes through
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendKind {
    /// Call the reasoning oracle from this process
    Direct,
    /// Post to a running gateway server's `/api/analyze`
    Remote { base_url: String },
}

/// Oracle gateway configuration
#[derive(Debug)]
pub struct OracleConfig {
    /// Absent keys are reported per analysis as a configuration error
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_audio_bytes: usize,
    pub request_timeout: Duration,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_ORACLE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_audio_bytes: DEFAULT_MAX_AUDIO_BYTES,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl OracleConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// `Configuration` when a value is present but out of range.
    pub fn from_env() -> AuditResult<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(SecretString::new);

        let base_url = std::env::var("CLARA_ORACLE_URL")
            .unwrap_or_else(|_| DEFAULT_ORACLE_URL.to_string());

        let model = std::env::var("CLARA_MODEL")
            .unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let temperature = std::env::var("CLARA_TEMPERATURE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TEMPERATURE);

        let max_audio_bytes = std::env::var("CLARA_MAX_AUDIO_BYTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_AUDIO_BYTES);

        let request_timeout_secs = std::env::var("CLARA_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        let config = Self {
            api_key,
            base_url,
            model,
            temperature,
            max_audio_bytes,
            request_timeout: Duration::from_secs(request_timeout_secs),
        };
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::new(api_key.into()));
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// # Errors
    ///
    /// `Configuration` for an empty model, a non-HTTP base URL, a temperature
    /// outside `0.0..=2.0`, or a zero audio cap.
    pub fn validate(&self) -> AuditResult<()> {
        if self.model.trim().is_empty() {
            return Err(AuditError::Configuration("model name is empty".to_string()));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(AuditError::Configuration(format!(
                "oracle URL `{}` is not an http(s) URL",
                self.base_url
            )));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AuditError::Configuration(format!(
                "temperature {} is outside 0.0..=2.0",
                self.temperature
            )));
        }
        if self.max_audio_bytes == 0 {
            return Err(AuditError::Configuration("audio size limit must be positive".to_string()));
        }
        Ok(())
    }
}
