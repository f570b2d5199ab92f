use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use clinical_audit::{AuditError, OracleError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

/// Body of every non-2xx response. Clients read `error`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Human-readable error message
    pub error: String,
    pub error_type: String,
    /// Unique error ID for correlating with server logs
    pub error_id: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Main API error enum
///
/// Display is the client-facing message; classification lives in the variant.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{message}")]
    BadRequest { message: String },

    #[error("{message}")]
    PayloadTooLarge { message: String },

    /// Server-side misconfiguration such as a missing oracle credential
    #[error("{message}")]
    Configuration { message: String },

    /// The oracle answered, but not with a usable audit
    #[error("{message}")]
    BadGateway { message: String },

    #[error("{message}")]
    RateLimit { message: String },

    #[error("{message}")]
    Internal { message: String },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Configuration { .. } | ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
            ApiError::RateLimit { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::BadRequest { .. } => "invalid_request",
            ApiError::PayloadTooLarge { .. } => "payload_too_large",
            ApiError::Configuration { .. } => "configuration_error",
            ApiError::BadGateway { .. } => "bad_gateway",
            ApiError::RateLimit { .. } => "rate_limit_exceeded",
            ApiError::Internal { .. } => "internal_error",
        }
    }
}

impl From<AuditError> for ApiError {
    fn from(err: AuditError) -> Self {
        match err {
            AuditError::Configuration(message) => ApiError::Configuration { message },
            AuditError::InvalidRequest(_) | AuditError::InputRead(_) => ApiError::bad_request(err.to_string()),
            AuditError::Oracle(oracle) => match oracle {
                OracleError::EmptyResponse => ApiError::BadGateway {
                    message: oracle.to_string(),
                },
                OracleError::MalformedResponse { ref detail } => {
                    warn!(detail = %detail, "Rejected malformed oracle audit");
                    ApiError::BadGateway {
                        message: oracle.to_string(),
                    }
                }
                OracleError::Upstream {
                    status: Some(429),
                    message,
                } => ApiError::RateLimit { message },
                OracleError::Upstream { message, .. } => ApiError::Internal { message },
            },
            AuditError::AnalysisInFlight | AuditError::InvalidTransition { .. } => ApiError::internal(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return ApiError::PayloadTooLarge {
                message: "Request body exceeds the upload limit.".to_string(),
            };
        }
        warn!(rejection = %rejection.body_text(), "Rejected request body");
        ApiError::bad_request("Invalid request body.")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4().to_string();
        let status_code = self.status_code();

        // Log the error with correlation ID
        error!(
            error_id = %error_id,
            error_type = %self.error_type(),
            status_code = %status_code.as_u16(),
            error = %self,
            "API error occurred"
        );

        let body = ApiErrorResponse {
            error: self.to_string(),
            error_type: self.error_type().to_string(),
            error_id,
            timestamp: chrono::Utc::now(),
        };

        (status_code, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_keeps_exact_message() {
        let err = ApiError::from(AuditError::missing_credential());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "GEMINI_API_KEY is not configured on the server.");
    }

    #[test]
    fn oracle_failures_map_by_kind() {
        let empty = ApiError::from(AuditError::from(OracleError::EmptyResponse));
        assert_eq!(empty.status_code(), StatusCode::BAD_GATEWAY);

        let malformed = ApiError::from(AuditError::from(OracleError::malformed("bias_type: unknown variant")));
        assert_eq!(malformed.status_code(), StatusCode::BAD_GATEWAY);
        assert!(!malformed.to_string().contains("bias_type"));

        let upstream = ApiError::from(AuditError::from(OracleError::upstream(Some(500), "model overloaded")));
        assert_eq!(upstream.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(upstream.to_string(), "model overloaded");

        let limited = ApiError::from(AuditError::from(OracleError::upstream(Some(429), "quota exhausted")));
        assert_eq!(limited.status_code(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn invalid_requests_are_bad_requests() {
        let err = ApiError::from(AuditError::InvalidRequest("request carries both audio and text".to_string()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_type(), "invalid_request");
    }
}
