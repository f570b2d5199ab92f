use axum::{
    routing::{get, post},
    Router,
};

use crate::{
    handlers::{analyze, health},
    server::ClaraServer,
};

pub const ANALYZE_PATH: &str = "/api/analyze";
pub const HEALTH_PATH: &str = "/health";

/// Create health check routes
pub fn health_routes() -> Router<ClaraServer> {
    Router::new().route(HEALTH_PATH, get(health::health_check))
}

/// Create analysis routes
pub fn analysis_routes() -> Router<ClaraServer> {
    Router::new().route(ANALYZE_PATH, post(analyze::analyze_consultation))
}

pub fn create_routes() -> Router<ClaraServer> {
    Router::new().merge(health_routes()).merge(analysis_routes())
}
