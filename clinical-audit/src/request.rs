use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::{AuditError, AuditResult};

/// Normalized analysis request: exactly one of audio or text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisRequest {
    /// Base64 audio payload without any data-URI prefix
    Audio { data: String, mime_type: String },
    Text { content: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Audio,
    Text,
}

impl RequestKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestKind::Audio => "audio",
            RequestKind::Text => "text",
        }
    }
}

/// Wire body of `POST /api/analyze`.
///
/// Every field is optional here so that shape errors are reported as
/// `InvalidRequest` rather than as a deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequestBody {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

fn present(field: Option<&String>) -> bool {
    field.is_some_and(|v| !v.trim().is_empty())
}

fn invalid(message: impl Into<String>) -> AuditError {
    AuditError::InvalidRequest(message.into())
}

/// `audio/*`, compared case-insensitively.
pub fn is_audio_mime_type(mime_type: &str) -> bool {
    mime_type.trim().to_ascii_lowercase().starts_with("audio/")
}

impl AnalysisRequest {
    /// # Errors
    ///
    /// `InvalidRequest` when either part is blank.
    pub fn audio(data: impl Into<String>, mime_type: impl Into<String>) -> AuditResult<Self> {
        Self::from_parts(Some((data.into(), mime_type.into())), None)
    }

    /// # Errors
    ///
    /// `InvalidRequest` when the transcript is blank.
    pub fn text(content: impl Into<String>) -> AuditResult<Self> {
        Self::from_parts(None, Some(content.into()))
    }

    /// Build a request from optional parts, rejecting both or neither.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` unless exactly one non-blank variant is supplied.
    pub fn from_parts(audio: Option<(String, String)>, text: Option<String>) -> AuditResult<Self> {
        let audio = audio.filter(|(data, _)| !data.trim().is_empty());
        let text = text.filter(|t| !t.trim().is_empty());

        match (audio, text) {
            (Some(_), Some(_)) => Err(invalid("request carries both audio and text")),
            (None, None) => Err(invalid("request carries neither audio nor text")),
            (Some((data, mime_type)), None) => {
                if mime_type.trim().is_empty() {
                    return Err(invalid("audio request is missing its mime type"));
                }
                Ok(AnalysisRequest::Audio { data, mime_type })
            }
            (None, Some(content)) => Ok(AnalysisRequest::Text { content }),
        }
    }

    pub fn kind(&self) -> RequestKind {
        match self {
            AnalysisRequest::Audio { .. } => RequestKind::Audio,
            AnalysisRequest::Text { .. } => RequestKind::Text,
        }
    }

    /// Decoded size of the payload in bytes.
    pub fn payload_bytes(&self) -> usize {
        match self {
            AnalysisRequest::Audio { data, .. } => {
                let padding = data.bytes().rev().take_while(|&b| b == b'=').count();
                (data.len() / 4 * 3).saturating_sub(padding)
            }
            AnalysisRequest::Text { content } => content.len(),
        }
    }

    /// Reject audio payloads over the transmission cap.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` when the decoded audio exceeds `max_audio_bytes`.
    pub fn ensure_within(&self, max_audio_bytes: usize) -> AuditResult<()> {
        if self.kind() == RequestKind::Audio && self.payload_bytes() > max_audio_bytes {
            return Err(invalid(format!(
                "audio payload of {} bytes exceeds the {} byte limit",
                self.payload_bytes(),
                max_audio_bytes
            )));
        }
        Ok(())
    }

    /// Check what must hold before a request leaves the process. The variants
    /// are public, so this is repeated at every boundary that sends one.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for a blank transcript, a blank or non-base64 audio
    /// payload, or a media type outside `audio/*`.
    pub fn validate(&self) -> AuditResult<()> {
        match self {
            AnalysisRequest::Text { content } => {
                if content.trim().is_empty() {
                    return Err(invalid("transcript is empty"));
                }
            }
            AnalysisRequest::Audio { data, mime_type } => {
                if data.trim().is_empty() {
                    return Err(invalid("audio payload is empty"));
                }
                if !is_audio_mime_type(mime_type) {
                    return Err(invalid(format!("unsupported media type `{mime_type}`; expected audio/*")));
                }
                if STANDARD.decode(data.as_bytes()).is_err() {
                    return Err(invalid("audio data is not valid base64"));
                }
            }
        }
        Ok(())
    }

    pub fn to_body(&self) -> AnalyzeRequestBody {
        match self {
            AnalysisRequest::Audio { data, mime_type } => AnalyzeRequestBody {
                kind: Some(RequestKind::Audio.as_str().to_string()),
                data: Some(data.clone()),
                mime_type: Some(mime_type.clone()),
                text: None,
            },
            AnalysisRequest::Text { content } => AnalyzeRequestBody {
                kind: Some(RequestKind::Text.as_str().to_string()),
                data: None,
                mime_type: None,
                text: Some(content.clone()),
            },
        }
    }
}

impl TryFrom<AnalyzeRequestBody> for AnalysisRequest {
    type Error = AuditError;

    fn try_from(body: AnalyzeRequestBody) -> AuditResult<Self> {
        let has_audio = present(body.data.as_ref()) || present(body.mime_type.as_ref());
        let has_text = present(body.text.as_ref());

        let request = match body.kind.as_deref() {
            Some("audio") => {
                if has_text {
                    return Err(invalid("audio request must not carry text"));
                }
                let (Some(data), Some(mime_type)) = (body.data, body.mime_type) else {
                    return Err(invalid("audio request requires data and mimeType"));
                };
                AnalysisRequest::audio(data, mime_type)?
            }
            Some("text") => {
                if has_audio {
                    return Err(invalid("text request must not carry audio"));
                }
                AnalysisRequest::text(body.text.unwrap_or_default())?
            }
            Some(other) => return Err(invalid(format!("unknown request type `{other}`"))),
            None => return Err(invalid("request type is missing")),
        };
        request.validate()?;
        Ok(request)
    }
}
