//! Analysis orchestrator: drives one session from submission to a terminal
//! phase.
//!
//! The orchestrator is the only writer of the session. Presenters read
//! snapshots through [`AnalysisOrchestrator::session`] or a
//! [`AnalysisOrchestrator::subscribe`] receiver. Each oracle call runs as one
//! spawned task tagged with the session id; a reset aborts the task and any
//! outcome that still arrives for an older session is dropped.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{AuditError, AuditResult};
use crate::media::MediaRegistry;
use crate::model::AnalysisResult;
use crate::normalizer::{InputNormalizer, RawInput};
use crate::providers::AnalysisBackend;
use crate::session::{AnalysisSession, Phase};

pub const TRANSCRIPT_LABEL: &str = "Pasted transcript";
pub const AUDIO_LABEL: &str = "Uploaded audio";
pub const LOST_TASK_REASON: &str = "The analysis task stopped before returning a result.";

/// Raw input plus the name the presenter shows for it.
#[derive(Debug, Clone)]
pub struct Submission {
    pub label: String,
    pub input: RawInput,
}

impl Submission {
    /// Audio file on disk, labeled with its file name.
    pub fn audio_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let label = path
            .file_name()
            .map_or_else(|| AUDIO_LABEL.to_string(), |name| name.to_string_lossy().into_owned());
        Self {
            label,
            input: RawInput::AudioFile { path, mime_type: None },
        }
    }

    pub fn audio_bytes(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            label: AUDIO_LABEL.to_string(),
            input: RawInput::AudioBytes {
                bytes,
                mime_type: mime_type.into(),
            },
        }
    }

    pub fn encoded_audio(payload: impl Into<String>, mime_type: Option<String>) -> Self {
        Self {
            label: AUDIO_LABEL.to_string(),
            input: RawInput::EncodedAudio {
                payload: payload.into(),
                mime_type,
            },
        }
    }

    pub fn transcript(text: impl Into<String>) -> Self {
        Self {
            label: TRANSCRIPT_LABEL.to_string(),
            input: RawInput::Transcript { text: text.into() },
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    fn transcript_echo(&self) -> Option<String> {
        match &self.input {
            RawInput::Transcript { text } => Some(text.clone()),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct OracleOutcome {
    session_id: Uuid,
    result: AuditResult<AnalysisResult>,
}

struct InFlight {
    session_id: Uuid,
    task: JoinHandle<()>,
}

pub struct AnalysisOrchestrator {
    backend: Arc<dyn AnalysisBackend>,
    normalizer: InputNormalizer,
    media: MediaRegistry,
    session: AnalysisSession,
    in_flight: Option<InFlight>,
    outcomes_tx: mpsc::UnboundedSender<OracleOutcome>,
    outcomes_rx: mpsc::UnboundedReceiver<OracleOutcome>,
    snapshots: watch::Sender<AnalysisSession>,
}

impl AnalysisOrchestrator {
    pub fn new(backend: Arc<dyn AnalysisBackend>, normalizer: InputNormalizer) -> Self {
        Self::with_media_registry(backend, normalizer, MediaRegistry::new())
    }

    /// Use a registry shared with a presenter that plays the source audio.
    pub fn with_media_registry(
        backend: Arc<dyn AnalysisBackend>,
        normalizer: InputNormalizer,
        media: MediaRegistry,
    ) -> Self {
        let session = AnalysisSession::new();
        let (outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();
        let (snapshots, _) = watch::channel(session.clone());
        Self {
            backend,
            normalizer,
            media,
            session,
            in_flight: None,
            outcomes_tx,
            outcomes_rx,
            snapshots,
        }
    }

    pub fn session(&self) -> &AnalysisSession {
        &self.session
    }

    pub fn snapshot(&self) -> AnalysisSession {
        self.session.clone()
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<AnalysisSession> {
        self.snapshots.subscribe()
    }

    pub fn media(&self) -> &MediaRegistry {
        &self.media
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.session.clone());
    }

    /// Start an analysis and return its session id.
    ///
    /// Normalization runs before this returns; the oracle call continues in
    /// the background until [`wait_for_outcome`](Self::wait_for_outcome) or
    /// [`poll_outcome`](Self::poll_outcome) picks it up. Normalization
    /// failures end the session in `Failed` and are not returned as errors.
    /// A terminal session is reset first.
    ///
    /// # Errors
    ///
    /// `AnalysisInFlight` while another submission is unfinished.
    pub async fn submit(&mut self, submission: Submission) -> AuditResult<Uuid> {
        if self.session.phase().is_in_flight() {
            warn!(session_id = %self.session.id(), phase = %self.session.phase(), "Rejected overlapping submission");
            return Err(AuditError::AnalysisInFlight);
        }
        if self.session.phase().is_terminal() {
            self.reset();
        }

        let echo = submission.transcript_echo();
        self.session.begin(submission.label, echo)?;
        let session_id = self.session.id();
        info!(
            session_id = %session_id,
            label = self.session.label().unwrap_or_default(),
            "Analysis submitted"
        );
        self.publish();

        let normalized = match self.normalizer.normalize(submission.input).await {
            Ok(normalized) => normalized,
            Err(err) => {
                warn!(session_id = %session_id, error_kind = err.kind(), "Input normalization failed");
                self.session.fail(err.to_string())?;
                self.publish();
                return Ok(session_id);
            }
        };

        if let Some(blob) = normalized.media {
            let handle = self.media.register(blob);
            self.session.attach_source(handle)?;
        }
        self.session.mark_awaiting()?;
        debug!(
            session_id = %session_id,
            kind = normalized.request.kind().as_str(),
            backend = self.backend.name(),
            "Awaiting oracle"
        );
        self.publish();

        let backend = Arc::clone(&self.backend);
        let outcomes = self.outcomes_tx.clone();
        let request = normalized.request;
        let task = tokio::spawn(async move {
            let result = backend.analyze(&request).await;
            // The receiver lives as long as the orchestrator.
            let _ = outcomes.send(OracleOutcome { session_id, result });
        });
        self.in_flight = Some(InFlight { session_id, task });

        Ok(session_id)
    }

    /// Wait until the current session leaves `Awaiting`.
    pub async fn wait_for_outcome(&mut self) -> &AnalysisSession {
        while self.session.phase() == Phase::Awaiting {
            if self.in_flight.is_none() {
                match self.outcomes_rx.try_recv() {
                    Ok(outcome) => self.apply_outcome(outcome),
                    Err(_) => self.fail_lost_task(),
                }
                continue;
            }
            let Some(in_flight) = self.in_flight.as_mut() else {
                continue;
            };

            tokio::select! {
                biased;
                Some(outcome) = self.outcomes_rx.recv() => self.apply_outcome(outcome),
                joined = &mut in_flight.task => {
                    self.in_flight = None;
                    if let Err(err) = joined {
                        warn!(session_id = %self.session.id(), error = %err, "Analysis task ended abnormally");
                    }
                }
            }
        }
        &self.session
    }

    /// Apply any outcome that has already arrived without waiting. A task
    /// that finished without sending one fails the session.
    ///
    /// Returns `true` when the session changed phase.
    pub fn poll_outcome(&mut self) -> bool {
        let before = self.session.phase();
        self.drain_outcomes();

        let task_finished = match &self.in_flight {
            Some(in_flight) => in_flight.task.is_finished(),
            None => true,
        };
        if self.session.phase() == Phase::Awaiting && task_finished {
            // A finished task has already sent whatever it was going to send.
            self.drain_outcomes();
            if self.session.phase() == Phase::Awaiting {
                self.in_flight = None;
                self.fail_lost_task();
            }
        }
        self.session.phase() != before
    }

    fn drain_outcomes(&mut self) {
        while let Ok(outcome) = self.outcomes_rx.try_recv() {
            self.apply_outcome(outcome);
        }
    }

    /// Submit and wait for the terminal snapshot.
    ///
    /// # Errors
    ///
    /// `AnalysisInFlight` while another submission is unfinished.
    pub async fn run(&mut self, submission: Submission) -> AuditResult<AnalysisSession> {
        self.submit(submission).await?;
        Ok(self.wait_for_outcome().await.clone())
    }

    /// Abandon any in-flight analysis, release the source media and start a
    /// fresh `Idle` session. Calling it on an `Idle` session changes nothing.
    pub fn reset(&mut self) {
        if self.session.phase() == Phase::Idle && self.in_flight.is_none() {
            return;
        }
        if let Some(in_flight) = self.in_flight.take() {
            debug!(session_id = %in_flight.session_id, "Abandoning in-flight analysis");
            in_flight.task.abort();
        }
        if let Some(handle) = self.session.source_handle() {
            self.media.revoke(&handle);
        }
        info!(session_id = %self.session.id(), phase = %self.session.phase(), "Session reset");
        self.session = AnalysisSession::new();
        self.publish();
    }

    fn apply_outcome(&mut self, outcome: OracleOutcome) {
        if outcome.session_id != self.session.id() || self.session.phase() != Phase::Awaiting {
            debug!(session_id = %outcome.session_id, "Discarding stale oracle outcome");
            return;
        }
        self.in_flight = None;

        let applied = match outcome.result {
            Ok(result) => {
                info!(
                    session_id = %outcome.session_id,
                    events = result.total_issues(),
                    high_risk = result.high_risk_count(),
                    "Analysis complete"
                );
                self.session.complete(result)
            }
            Err(err) => {
                warn!(session_id = %outcome.session_id, error_kind = err.kind(), error = %err, "Analysis failed");
                self.session.fail(err.to_string())
            }
        };
        if let Err(err) = applied {
            warn!(error = %err, "Oracle outcome could not be applied");
        }
        self.publish();
    }

    fn fail_lost_task(&mut self) {
        warn!(session_id = %self.session.id(), "Analysis task ended without an outcome");
        if let Err(err) = self.session.fail(LOST_TASK_REASON) {
            warn!(error = %err, "Lost task could not be recorded");
        }
        self.publish();
    }
}

impl Drop for AnalysisOrchestrator {
    fn drop(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.task.abort();
        }
        if let Some(handle) = self.session.source_handle() {
            self.media.revoke(&handle);
        }
    }
}
