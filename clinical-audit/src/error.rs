use thiserror::Error;

use crate::session::Phase;

/// Message reported when the oracle credential is absent.
pub const MISSING_CREDENTIAL_MESSAGE: &str = "GEMINI_API_KEY is not configured on the server.";

#[derive(Error, Debug)]
pub enum AuditError {
    /// The submitted file could not be read or holds no usable bytes.
    #[error("Could not read the submitted input: {0}")]
    InputRead(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The request shape is wrong; no oracle call was made.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error("An analysis is already in progress; reset before submitting again")]
    AnalysisInFlight,

    #[error("Invalid session transition from {from} to {to}")]
    InvalidTransition { from: Phase, to: Phase },
}

/// Failures attributed to the reasoning service itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("Analysis failed: the reasoning service returned no content.")]
    EmptyResponse,

    /// The detail is kept for logs; the user-facing message stays generic.
    #[error("Analysis failed: the reasoning service returned an audit that could not be read.")]
    MalformedResponse { detail: String },

    #[error("{message}")]
    Upstream { status: Option<u16>, message: String },
}

impl OracleError {
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::MalformedResponse {
            detail: detail.into(),
        }
    }

    pub fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for OracleError {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16());
        let message = if err.is_timeout() {
            "The reasoning service did not respond in time.".to_string()
        } else if err.is_connect() {
            format!("Could not reach the reasoning service: {err}")
        } else {
            err.to_string()
        };
        Self::Upstream { status, message }
    }
}

impl AuditError {
    /// Stable machine-readable kind, used in API error bodies and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AuditError::InputRead(_) => "input_read_error",
            AuditError::Configuration(_) => "configuration_error",
            AuditError::InvalidRequest(_) => "invalid_request",
            AuditError::Oracle(OracleError::EmptyResponse) => "empty_response",
            AuditError::Oracle(OracleError::MalformedResponse { .. }) => "malformed_response",
            AuditError::Oracle(OracleError::Upstream { .. }) => "upstream_error",
            AuditError::AnalysisInFlight => "analysis_in_flight",
            AuditError::InvalidTransition { .. } => "invalid_transition",
        }
    }

    pub fn missing_credential() -> Self {
        AuditError::Configuration(MISSING_CREDENTIAL_MESSAGE.to_string())
    }
}

pub type AuditResult<T> = Result<T, AuditError>;
