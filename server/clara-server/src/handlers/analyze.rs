use axum::{extract::rejection::JsonRejection, extract::State, Json};
use clinical_audit::{AnalysisRequest, AnalysisResult, AnalyzeRequestBody, AuditError};
use tracing::info;

use crate::error::ApiError;
use crate::server::ClaraServer;

/// `POST /api/analyze`
///
/// The credential is checked before the body is inspected, so a server
/// without a key answers every analysis with the configuration error.
pub async fn analyze_consultation(
    State(server): State<ClaraServer>,
    payload: Result<Json<AnalyzeRequestBody>, JsonRejection>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let gateway = server.gateway();
    if !gateway.is_configured() {
        return Err(AuditError::missing_credential().into());
    }

    let Json(body) = payload?;
    let request = AnalysisRequest::try_from(body)?;
    info!(
        kind = request.kind().as_str(),
        payload_bytes = request.payload_bytes(),
        "Analysis request accepted"
    );

    let result = gateway.analyze(&request).await?;
    Ok(Json(result))
}
