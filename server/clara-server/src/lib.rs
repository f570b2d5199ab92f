//! CLARA Server - gateway between clients and the reasoning oracle
//!
//! Exposes `POST /api/analyze` for audio or transcript audits and
//! `GET /health`. The oracle credential never leaves the server.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;

// Re-export commonly used types
pub use error::{ApiError, ApiErrorResponse};
pub use server::ClaraServer;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router with all routes and middleware
pub fn create_app(server: ClaraServer) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    routes::create_routes()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(server.body_limit())),
        )
        .with_state(server)
}
