use axum::{extract::State, Json};
use serde::Serialize;

use crate::server::ClaraServer;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub model: String,
    /// Whether analyses can reach the oracle at all
    pub credential_configured: bool,
    pub uptime_seconds: u64,
}

pub async fn health_check(State(server): State<ClaraServer>) -> Json<HealthResponse> {
    let gateway = server.gateway();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        model: gateway.config().model.clone(),
        credential_configured: gateway.is_configured(),
        uptime_seconds: server.uptime_seconds(),
    })
}
