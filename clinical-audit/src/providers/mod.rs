pub mod gemini;
pub mod remote;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{BackendKind, OracleConfig};
use crate::error::AuditResult;
use crate::gateway::OracleGateway;
use crate::model::AnalysisResult;
use crate::request::AnalysisRequest;

/// Trait for anything that can turn a request into a validated audit
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Run one analysis. Exactly one upstream call, no retries.
    async fn analyze(&self, request: &AnalysisRequest) -> AuditResult<AnalysisResult>;
}

/// Create a backend instance based on configuration
///
/// # Errors
///
/// Propagates configuration and HTTP client construction failures.
pub fn create_backend(kind: &BackendKind, config: OracleConfig) -> AuditResult<Arc<dyn AnalysisBackend>> {
    match kind {
        BackendKind::Direct => Ok(Arc::new(OracleGateway::new(config)?)),
        BackendKind::Remote { base_url } => Ok(Arc::new(remote::RemoteGateway::new(
            base_url.clone(),
            config.request_timeout,
        )?)),
    }
}

pub(crate) fn http_client(timeout: Duration) -> AuditResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("clinical-audit/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| crate::error::AuditError::Configuration(format!("HTTP client could not be built: {e}")))
}
