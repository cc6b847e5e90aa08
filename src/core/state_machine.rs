//! Per-target publish phase tracking
//!
//! Each target runs through the same sequence of phases. The tracker keeps an
//! in-memory transition log so a failed run can report exactly how far a
//! target got. Nothing is persisted; a publish either completes or is rerun
//! from scratch.

use crate::core::descriptor::Target;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Phases of a single target's publish workflow
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PublishPhase {
    Init,
    AuthChecked,
    ArtifactResolved,
    PayloadBuilt,
    /// Debug mode prints the payload instead of calling the remote API
    DebugShortCircuit,
    RemoteQueried,
    Uploaded,
    PostProcessed,
    Done,
    Failed,
}

/// One recorded phase change
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PhaseTransition {
    pub from: PublishPhase,
    pub to: PublishPhase,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Tracks the publish workflow of one target
pub struct PublishTracker {
    target: Target,
    current_phase: PublishPhase,
    transitions: Vec<PhaseTransition>,
    error: Option<String>,
}

impl PublishTracker {
    pub fn new(target: Target) -> Self {
        Self {
            target,
            current_phase: PublishPhase::Init,
            transitions: Vec::new(),
            error: None,
        }
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn phase(&self) -> PublishPhase {
        self.current_phase
    }

    /// Advance to the given phase, recording the transition
    pub fn advance(&mut self, to: PublishPhase) {
        self.advance_with_note(to, None);
    }

    pub fn advance_with_note(&mut self, to: PublishPhase, note: Option<String>) {
        self.transitions.push(PhaseTransition {
            from: self.current_phase,
            to,
            timestamp: Utc::now(),
            note,
        });
        self.current_phase = to;
    }

    /// Mark the workflow as failed, keeping the error for the report
    pub fn fail(&mut self, error: impl Into<String>) {
        let message = error.into();
        self.advance_with_note(PublishPhase::Failed, Some(message.clone()));
        self.error = Some(message);
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.current_phase,
            PublishPhase::Done | PublishPhase::Failed | PublishPhase::DebugShortCircuit
        )
    }

    pub fn last_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Total wall-clock time between first and last transition, in ms
    pub fn elapsed_ms(&self) -> i64 {
        match (self.transitions.first(), self.transitions.last()) {
            (Some(first), Some(last)) => (last.timestamp - first.timestamp).num_milliseconds(),
            _ => 0,
        }
    }

    /// Transition history as a human-readable string
    pub fn history(&self) -> String {
        self.transitions
            .iter()
            .map(|t| {
                let note = t
                    .note
                    .as_ref()
                    .map(|n| format!(" ({n})"))
                    .unwrap_or_default();
                format!("{}: {:?} -> {:?}{}", t.timestamp.to_rfc3339(), t.from, t.to, note)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tracker_starts_at_init() {
        let tracker = PublishTracker::new(Target::Modrinth);

        assert_eq!(tracker.phase(), PublishPhase::Init);
        assert_eq!(tracker.target(), Target::Modrinth);
        assert!(!tracker.is_terminal());
    }

    #[test]
    fn test_advance_records_transitions() {
        let mut tracker = PublishTracker::new(Target::Curseforge);

        tracker.advance(PublishPhase::AuthChecked);
        tracker.advance(PublishPhase::ArtifactResolved);

        assert_eq!(tracker.phase(), PublishPhase::ArtifactResolved);
        assert_eq!(tracker.transitions.len(), 2);
        assert_eq!(tracker.transitions[0].from, PublishPhase::Init);
        assert_eq!(tracker.transitions[1].to, PublishPhase::ArtifactResolved);
    }

    #[test]
    fn test_fail_keeps_error() {
        let mut tracker = PublishTracker::new(Target::Github);

        tracker.advance(PublishPhase::AuthChecked);
        tracker.fail("upload rejected");

        assert_eq!(tracker.phase(), PublishPhase::Failed);
        assert!(tracker.is_terminal());
        assert_eq!(tracker.last_error(), Some("upload rejected"));
    }

    #[test]
    fn test_debug_short_circuit_is_terminal() {
        let mut tracker = PublishTracker::new(Target::Modrinth);

        tracker.advance(PublishPhase::PayloadBuilt);
        tracker.advance(PublishPhase::DebugShortCircuit);

        assert!(tracker.is_terminal());
        assert!(tracker.last_error().is_none());
    }

    #[test]
    fn test_history_is_readable() {
        let mut tracker = PublishTracker::new(Target::Curseforge);

        tracker.advance(PublishPhase::AuthChecked);
        tracker.advance_with_note(PublishPhase::Uploaded, Some("file id 12345".to_string()));

        let history = tracker.history();
        assert!(history.contains("Init -> AuthChecked"));
        assert!(history.contains("AuthChecked -> Uploaded (file id 12345)"));
    }

    #[test]
    fn test_elapsed_without_transitions_is_zero() {
        let tracker = PublishTracker::new(Target::Github);
        assert_eq!(tracker.elapsed_ms(), 0);
    }
}
