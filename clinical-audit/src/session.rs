//! Client-visible lifecycle of a single analysis.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AuditError, AuditResult};
use crate::media::SourceHandle;
use crate::model::AnalysisResult;

/// Reported when a failure carries no message of its own.
pub const FALLBACK_FAILURE_REASON: &str = "An unexpected error occurred during analysis.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    /// Input accepted, normalization running
    Submitting,
    /// Oracle call issued
    Awaiting,
    Complete,
    Failed,
}

impl Phase {
    /// Forward edges of the lifecycle. `Idle` is re-entered only by replacing
    /// the session, never by a transition.
    pub fn can_transition_to(self, next: Phase) -> bool {
        matches!(
            (self, next),
            (Phase::Idle, Phase::Submitting)
                | (Phase::Submitting, Phase::Awaiting | Phase::Failed)
                | (Phase::Awaiting, Phase::Complete | Phase::Failed)
        )
    }

    pub fn is_in_flight(self) -> bool {
        matches!(self, Phase::Submitting | Phase::Awaiting)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Complete | Phase::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Submitting => "submitting",
            Phase::Awaiting => "awaiting",
            Phase::Complete => "complete",
            Phase::Failed => "failed",
        }
    }

    /// Progress wording for presenters.
    pub fn status_label(self) -> &'static str {
        match self {
            Phase::Idle => "Ready for a consultation",
            Phase::Submitting => "Uploading consultation",
            Phase::Awaiting => "Analyzing clinical logic",
            Phase::Complete => "Audit complete",
            Phase::Failed => "Analysis failed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of one analysis, owned and written by the orchestrator.
///
/// `result` is present only in `Complete` and `failure_reason` only in
/// `Failed`. A reset replaces the whole value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSession {
    id: Uuid,
    phase: Phase,
    label: Option<String>,
    source_handle: Option<SourceHandle>,
    transcript_echo: Option<String>,
    result: Option<AnalysisResult>,
    failure_reason: Option<String>,
    submitted_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            phase: Phase::Idle,
            label: None,
            source_handle: None,
            transcript_echo: None,
            result: None,
            failure_reason: None,
            submitted_at: None,
            finished_at: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn source_handle(&self) -> Option<SourceHandle> {
        self.source_handle
    }

    pub fn transcript_echo(&self) -> Option<&str> {
        self.transcript_echo.as_deref()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    fn advance(&mut self, next: Phase) -> AuditResult<()> {
        if !self.phase.can_transition_to(next) {
            return Err(AuditError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        self.phase = next;
        Ok(())
    }

    /// `Idle -> Submitting`, capturing the label and any transcript echo.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless the session is `Idle`.
    pub fn begin(&mut self, label: impl Into<String>, transcript_echo: Option<String>) -> AuditResult<()> {
        self.advance(Phase::Submitting)?;
        self.label = Some(label.into());
        self.transcript_echo = transcript_echo;
        self.submitted_at = Some(Utc::now());
        Ok(())
    }

    /// Attach the playable source while the submission is being prepared.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` outside `Submitting`.
    pub fn attach_source(&mut self, handle: SourceHandle) -> AuditResult<()> {
        if self.phase != Phase::Submitting {
            return Err(AuditError::InvalidTransition {
                from: self.phase,
                to: Phase::Submitting,
            });
        }
        self.source_handle = Some(handle);
        Ok(())
    }

    /// `Submitting -> Awaiting`
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless the session is `Submitting`.
    pub fn mark_awaiting(&mut self) -> AuditResult<()> {
        self.advance(Phase::Awaiting)
    }

    /// `Awaiting -> Complete`, attaching the result verbatim.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless the session is `Awaiting`.
    pub fn complete(&mut self, result: AnalysisResult) -> AuditResult<()> {
        self.advance(Phase::Complete)?;
        self.result = Some(result);
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    /// `Submitting | Awaiting -> Failed`
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless an analysis is in flight.
    pub fn fail(&mut self, reason: impl Into<String>) -> AuditResult<()> {
        self.advance(Phase::Failed)?;
        let reason = reason.into();
        self.failure_reason = Some(if reason.trim().is_empty() {
            FALLBACK_FAILURE_REASON.to_string()
        } else {
            reason
        });
        self.finished_at = Some(Utc::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{MediaBlob, MediaRegistry};

    const ALL_PHASES: [Phase; 5] = [
        Phase::Idle,
        Phase::Submitting,
        Phase::Awaiting,
        Phase::Complete,
        Phase::Failed,
    ];

    #[test]
    fn only_forward_edges_are_allowed() {
        let allowed = [
            (Phase::Idle, Phase::Submitting),
            (Phase::Submitting, Phase::Awaiting),
            (Phase::Submitting, Phase::Failed),
            (Phase::Awaiting, Phase::Complete),
            (Phase::Awaiting, Phase::Failed),
        ];
        for from in ALL_PHASES {
            for to in ALL_PHASES {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn success_path_populates_result_only() {
        let mut session = AnalysisSession::new();
        session.begin("consult.mp3", None).unwrap();
        session.mark_awaiting().unwrap();
        session.complete(AnalysisResult::default()).unwrap();

        assert_eq!(session.phase(), Phase::Complete);
        assert!(session.result().is_some());
        assert!(session.failure_reason().is_none());
        assert!(session.finished_at().is_some());
    }

    #[test]
    fn failure_path_populates_reason_only() {
        let mut session = AnalysisSession::new();
        session.begin("Pasted transcript", Some("Dr: hello".to_string())).unwrap();
        session.fail("model overloaded").unwrap();

        assert_eq!(session.phase(), Phase::Failed);
        assert_eq!(session.failure_reason(), Some("model overloaded"));
        assert_eq!(session.transcript_echo(), Some("Dr: hello"));
        assert!(session.result().is_none());
    }

    #[test]
    fn blank_failure_gets_fallback_reason() {
        let mut session = AnalysisSession::new();
        session.begin("consult.wav", None).unwrap();
        session.fail("").unwrap();
        assert_eq!(session.failure_reason(), Some(FALLBACK_FAILURE_REASON));
    }

    #[test]
    fn terminal_sessions_reject_further_transitions() {
        let mut session = AnalysisSession::new();
        session.begin("consult.wav", None).unwrap();
        session.mark_awaiting().unwrap();
        session.complete(AnalysisResult::default()).unwrap();

        assert!(matches!(
            session.fail("late failure"),
            Err(AuditError::InvalidTransition { from: Phase::Complete, to: Phase::Failed })
        ));
        assert!(session.complete(AnalysisResult::default()).is_err());
        assert!(session.begin("again", None).is_err());
    }

    #[test]
    fn source_attaches_only_while_submitting() {
        let registry = MediaRegistry::new();
        let handle = registry.register(MediaBlob::new(vec![1, 2, 3], "audio/wav"));

        let mut session = AnalysisSession::new();
        assert!(session.attach_source(handle).is_err());
        session.begin("consult.wav", None).unwrap();
        session.attach_source(handle).unwrap();
        assert_eq!(session.source_handle(), Some(handle));
    }

    #[test]
    fn snapshot_serializes_for_presenters() {
        let mut session = AnalysisSession::new();
        session.begin("Pasted transcript", Some("Dr: hi".to_string())).unwrap();
        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(value["phase"], "submitting");
        assert_eq!(value["transcriptEcho"], "Dr: hi");
        assert!(value["failureReason"].is_null());
    }
}
