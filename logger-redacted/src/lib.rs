pub mod redactor;
pub mod config;

pub use redactor::*;
pub use config::*;

use thiserror::Error;
use tracing_subscriber::{
    fmt::{self, time::ChronoUtc},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// PHI-aware logging for clinical consultation tooling
///
/// Consultation transcripts and dialogue quotes are protected health
/// information. Nothing in this workspace logs them raw: log lines carry a
/// [`PhiRedactor::fingerprint`] for correlation and, at debug level, a
/// [`PhiRedactor::excerpt`] with identifiers masked.
///
/// # Detected Data Types
///
/// - **Email Addresses**: jane@clinic.org → j***@c***
/// - **Phone Numbers**: (555) 123-4567 → (***) ***-****
/// - **SSN**: 123-45-6789 → ***-**-****
/// - **Medical Record Numbers**: MRN 00482913 → MRN[REDACTED]
/// - **Dates**: 04/12/1961 → **/**/****
///
/// With `hash_for_correlation` (the default) each match becomes a tagged
/// short hash such as `EMAIL[Xk3...]` instead of a mask.
///
/// # Example
///
/// ```rust,no_run
/// use logger_redacted::{init_tracing, LoggerConfig, PhiRedactor};
/// use tracing::info;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     init_tracing(&LoggerConfig::from_env(false), &["clara_server"])?;
///
///     let redactor = PhiRedactor::default();
///     let transcript = "Pt (555) 123-4567 reports chest pain";
///     info!(transcript = %redactor.fingerprint(transcript), "Transcript received");
///     Ok(())
/// }
/// ```
#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("Failed to install tracing subscriber: {0}")]
    Init(String),
}

/// Install the global subscriber. `RUST_LOG` overrides the directives built
/// from `config` and `crates`.
pub fn init_tracing(config: &LoggerConfig, crates: &[&str]) -> Result<(), LoggerError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.directives(crates)));

    let result = match config.format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_file(config.with_source_location)
                    .with_line_number(config.with_source_location)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(config.ansi),
            )
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false)
                    .json(),
            )
            .try_init(),
    };

    result.map_err(|e| LoggerError::Init(e.to_string()))
}
