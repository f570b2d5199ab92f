//! Clinical Reasoning Audit Core
//!
//! Audits doctor-patient consultations (audio recordings or transcripts) for
//! cognitive shortcuts in clinical reasoning. Language understanding is
//! delegated to an external reasoning oracle; this crate owns everything
//! around that call.
//!
//! # Components
//!
//! - **Input normalization**: audio files, bytes or base64 payloads and plain
//!   transcripts become one canonical [`AnalysisRequest`]
//! - **Schema contract**: one response schema constrains oracle generation
//!   and validates every reply
//! - **Oracle gateway**: exactly one schema-constrained call per analysis,
//!   with classified failures
//! - **Orchestrator**: the client-visible session lifecycle
//!   (`Idle -> Submitting -> Awaiting -> Complete | Failed`)
//!
//! # Bias categories
//!
//! - Diagnostic Shadowing: new symptoms attributed to a known history
//! - Premature Closure: inquiry stops at the first benign explanation
//! - Anchoring Bias: an early label outweighs contradicting information
//! - Safe Practice: sound handling, recorded with risk level `None`
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use clinical_audit::{AnalysisOrchestrator, InputNormalizer, OracleConfig, OracleGateway, Submission};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = OracleConfig::from_env()?;
//! let normalizer = InputNormalizer::new(config.max_audio_bytes);
//! let gateway = Arc::new(OracleGateway::new(config)?);
//! let mut orchestrator = AnalysisOrchestrator::new(gateway, normalizer);
//!
//! let session = orchestrator
//!     .run(Submission::transcript("Dr: It's likely just your anxiety acting up."))
//!     .await?;
//!
//! if let Some(result) = session.result() {
//!     println!("{} issues, {} high risk", result.total_issues(), result.high_risk_count());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod directive;
pub mod error;
pub mod gateway;
pub mod media;
pub mod model;
pub mod normalizer;
pub mod orchestrator;
pub mod providers;
pub mod request;
pub mod schema;
pub mod session;

pub use config::{BackendKind, OracleConfig};
pub use error::{AuditError, AuditResult, OracleError};
pub use gateway::OracleGateway;
pub use media::{MediaBlob, MediaRegistry, SourceHandle};
pub use model::{AnalysisResult, AuditEvent, BiasType, RiskBucket, RiskLevel};
pub use normalizer::{InputNormalizer, NormalizedInput, RawInput};
pub use orchestrator::{AnalysisOrchestrator, Submission};
pub use providers::remote::RemoteGateway;
pub use providers::{create_backend, AnalysisBackend};
pub use request::{AnalysisRequest, AnalyzeRequestBody, RequestKind};
pub use schema::SchemaContract;
pub use session::{AnalysisSession, Phase};
