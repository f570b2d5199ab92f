use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use clinical_audit::OracleConfig;
use logger_redacted::{init_tracing, LoggerConfig};
use tracing::{info, warn};

use clara_server::{create_app, routes, ClaraServer};

/// CLARA gateway HTTP server
#[derive(Parser, Debug)]
#[command(name = "clara-server")]
#[command(about = "Clinical reasoning audit gateway in front of the reasoning oracle")]
struct Args {
    /// Server bind address
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Server port
    #[arg(short, long, env = "PORT", default_value_t = 3001)]
    port: u16,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    init_tracing(
        &LoggerConfig::from_env(args.verbose),
        &["clara_server", "clinical_audit", "logger_redacted"],
    )?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting CLARA gateway server");

    let config = OracleConfig::from_env().context("Invalid oracle configuration")?;
    info!(
        model = %config.model,
        max_audio_bytes = config.max_audio_bytes,
        timeout_secs = config.request_timeout.as_secs(),
        "Oracle configuration loaded"
    );
    if !config.has_credential() {
        warn!("GEMINI_API_KEY is not set; /api/analyze will answer with a configuration error");
    }

    let server = ClaraServer::new(config).context("Failed to initialise the oracle gateway")?;
    let app = create_app(server);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", args.host, args.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!("CLARA gateway running on http://{addr}");
    info!("Analysis endpoint: http://{addr}{}", routes::ANALYZE_PATH);
    info!("Health check: http://{addr}{}", routes::HEALTH_PATH);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("CLARA gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Could not install the shutdown handler");
        std::future::pending::<()>().await;
    }
}
