/// Remote gateway - analyses through a running `clara-server`
///
/// Posts the canonical request body to `/api/analyze` and validates the
/// returned audit against the schema contract like any other oracle reply.
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{AuditError, AuditResult, OracleError};
use crate::model::AnalysisResult;
use crate::providers::{http_client, AnalysisBackend};
use crate::request::AnalysisRequest;
use crate::schema::SchemaContract;

pub const ANALYZE_PATH: &str = "/api/analyze";

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

pub struct RemoteGateway {
    http: reqwest::Client,
    base_url: String,
}

impl RemoteGateway {
    /// # Errors
    ///
    /// `Configuration` for a non-HTTP URL or an unbuildable client.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> AuditResult<Self> {
        let base_url = base_url.into();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(AuditError::Configuration(format!(
                "gateway URL `{base_url}` is not an http(s) URL"
            )));
        }
        Ok(Self {
            http: http_client(timeout)?,
            base_url,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}{ANALYZE_PATH}", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl AnalysisBackend for RemoteGateway {
    fn name(&self) -> &str {
        "remote-gateway"
    }

    async fn analyze(&self, request: &AnalysisRequest) -> AuditResult<AnalysisResult> {
        request.validate()?;
        info!(
            endpoint = %self.endpoint(),
            kind = request.kind().as_str(),
            payload_bytes = request.payload_bytes(),
            "Posting analysis to gateway"
        );

        let response = self
            .http
            .post(self.endpoint())
            .json(&request.to_body())
            .send()
            .await
            .map_err(OracleError::from)?;

        let status = response.status();
        let body = response.text().await.map_err(OracleError::from)?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| format!("Server error: {}", status.as_u16()));
            return Err(OracleError::upstream(Some(status.as_u16()), message).into());
        }

        debug!(status = status.as_u16(), body_bytes = body.len(), "Gateway replied");
        Ok(SchemaContract::parse(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_path() {
        let gateway = RemoteGateway::new("http://localhost:3001/", Duration::from_secs(5)).unwrap();
        assert_eq!(gateway.endpoint(), "http://localhost:3001/api/analyze");
    }

    #[test]
    fn rejects_non_http_url() {
        let result = RemoteGateway::new("localhost:3001", Duration::from_secs(5));
        assert!(matches!(result, Err(AuditError::Configuration(_))));
    }
}
