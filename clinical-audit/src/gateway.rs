//! Oracle gateway: one schema-constrained oracle call per analysis.
//!
//! The gateway holds no state between calls. Each `analyze` checks the
//! credential, then the request and its payload cap, and builds a single
//! `generateContent` request carrying the system directive, the content part,
//! the schema contract and a fixed low temperature. The reply is validated
//! before it is returned.

use std::borrow::Cow;

use async_trait::async_trait;
use logger_redacted::PhiRedactor;
use tracing::{debug, info, warn};

use crate::config::OracleConfig;
use crate::directive::{transcript_part, ANALYSIS_INSTRUCTION, SYSTEM_DIRECTIVE};
use crate::error::{AuditError, AuditResult, OracleError};
use crate::model::AnalysisResult;
use crate::providers::gemini::{Content, GeminiClient, GenerateContentRequest, GenerationConfig, InlineData, Part};
use crate::providers::{http_client, AnalysisBackend};
use crate::request::AnalysisRequest;
use crate::schema::SchemaContract;

const JSON_MIME_TYPE: &str = "application/json";

pub struct OracleGateway {
    config: OracleConfig,
    client: GeminiClient,
    redactor: PhiRedactor,
}

impl OracleGateway {
    /// # Errors
    ///
    /// `Configuration` when the configuration is invalid. A missing credential
    /// is not an error here; it is reported by each `analyze` call.
    pub fn new(config: OracleConfig) -> AuditResult<Self> {
        config.validate()?;
        if !config.has_credential() {
            warn!("GEMINI_API_KEY is not configured; analyses will fail until it is set");
        }
        let client = GeminiClient::new(
            http_client(config.request_timeout)?,
            config.base_url.clone(),
            config.model.clone(),
        );
        Ok(Self {
            config,
            client,
            redactor: PhiRedactor::default(),
        })
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    pub fn is_configured(&self) -> bool {
        self.config.has_credential()
    }

    /// Build the single oracle call for `request`.
    pub fn build_call<'a>(&'a self, request: &'a AnalysisRequest) -> GenerateContentRequest<'a> {
        let content_part = match request {
            AnalysisRequest::Audio { data, mime_type } => Part::InlineData {
                inline_data: InlineData { mime_type, data },
            },
            AnalysisRequest::Text { content } => Part::Text {
                text: Cow::Owned(transcript_part(content)),
            },
        };

        GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part::Text {
                    text: Cow::Borrowed(SYSTEM_DIRECTIVE),
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![
                    content_part,
                    Part::Text {
                        text: Cow::Borrowed(ANALYSIS_INSTRUCTION),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: JSON_MIME_TYPE,
                response_schema: SchemaContract::response_schema(),
                temperature: self.config.temperature,
            },
        }
    }

    /// Analyze one request.
    ///
    /// # Errors
    ///
    /// `Configuration` without a credential, `InvalidRequest` for a request
    /// that fails [`AnalysisRequest::validate`] or oversized audio (all before
    /// any network traffic), and `Oracle` errors for
    /// upstream, empty or schema-violating replies.
    pub async fn analyze(&self, request: &AnalysisRequest) -> AuditResult<AnalysisResult> {
        let api_key = self.config.api_key.as_ref().ok_or_else(AuditError::missing_credential)?;
        request.validate()?;
        request.ensure_within(self.config.max_audio_bytes)?;

        match request {
            AnalysisRequest::Audio { mime_type, .. } => info!(
                model = %self.config.model,
                mime_type = %mime_type,
                payload_bytes = request.payload_bytes(),
                "Submitting audio consultation to oracle"
            ),
            AnalysisRequest::Text { content } => info!(
                model = %self.config.model,
                transcript_fingerprint = %self.redactor.fingerprint(content),
                transcript_chars = content.chars().count(),
                "Submitting transcript to oracle"
            ),
        }
        if let AnalysisRequest::Text { content } = request {
            debug!(excerpt = %self.redactor.excerpt(content, 120), "Transcript excerpt");
        }

        let call = self.build_call(request);
        let raw = self
            .client
            .generate(api_key, &call)
            .await?
            .ok_or(OracleError::EmptyResponse)?;

        match SchemaContract::parse(&raw) {
            Ok(result) => {
                info!(
                    events = result.total_issues(),
                    high_risk = result.high_risk_count(),
                    "Oracle audit accepted"
                );
                Ok(result)
            }
            Err(err) => {
                if let OracleError::MalformedResponse { detail } = &err {
                    warn!(detail = %detail, "Oracle reply violated the schema contract");
                }
                Err(err.into())
            }
        }
    }
}

#[async_trait]
impl AnalysisBackend for OracleGateway {
    fn name(&self) -> &str {
        "oracle-gateway"
    }

    async fn analyze(&self, request: &AnalysisRequest) -> AuditResult<AnalysisResult> {
        OracleGateway::analyze(self, request).await
    }
}
