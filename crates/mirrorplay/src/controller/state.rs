//! Playback phase state machine.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::source::{ContentSource, Slot};

/// Phase of one playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// The active source is loading; a timeout is armed.
    Loading,
    /// The active source started rendering.
    Ready,
    /// The active source just failed and an alternate is being considered.
    FailedRetryable,
    /// Every known source failed; waiting for the viewer.
    FailedTerminal,
    /// The content item has no playable source at all.
    NoSource,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loading => "LOADING",
            Self::Ready => "READY",
            Self::FailedRetryable => "FAILED_RETRYABLE",
            Self::FailedTerminal => "FAILED_TERMINAL",
            Self::NoSource => "NO_SOURCE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LOADING" => Some(Self::Loading),
            "READY" => Some(Self::Ready),
            "FAILED_RETRYABLE" => Some(Self::FailedRetryable),
            "FAILED_TERMINAL" => Some(Self::FailedTerminal),
            "NO_SOURCE" => Some(Self::NoSource),
            _ => None,
        }
    }

    /// Check if this phase is a failure.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::FailedRetryable | Self::FailedTerminal)
    }

    /// Validate a phase transition.
    pub fn can_transition_to(&self, target: Phase) -> bool {
        use Phase::*;

        match (self, target) {
            // Re-entering Loading restarts the load on a new source.
            (Loading, Loading | Ready | FailedRetryable) => true,

            // Manual toggle from a rendering source.
            (Ready, Loading) => true,

            // Automatic failover or exhaustion.
            (FailedRetryable, Loading | FailedTerminal) => true,

            // Only the viewer leaves the terminal phase.
            (FailedTerminal, Loading) => true,

            // NoSource is final for the content item.
            _ => false,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Runtime selection state, owned exclusively by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionState {
    pub(crate) active: Option<Slot>,
    pub(crate) attempted: FxHashSet<ContentSource>,
    pub(crate) phase: Phase,
}

impl SelectionState {
    pub(crate) fn no_source() -> Self {
        Self {
            active: None,
            attempted: FxHashSet::default(),
            phase: Phase::NoSource,
        }
    }

    pub(crate) fn loading(slot: Slot) -> Self {
        Self {
            active: Some(slot),
            attempted: FxHashSet::default(),
            phase: Phase::Loading,
        }
    }

    pub fn active(&self) -> Option<Slot> {
        self.active
    }

    /// Sources that failed in this session.
    pub fn attempted(&self) -> &FxHashSet<ContentSource> {
        &self.attempted
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_round_trips_through_str() {
        for phase in [
            Phase::Loading,
            Phase::Ready,
            Phase::FailedRetryable,
            Phase::FailedTerminal,
            Phase::NoSource,
        ] {
            assert_eq!(Phase::parse(phase.as_str()), Some(phase));
        }
        assert_eq!(Phase::parse("loading"), None);
    }

    #[test]
    fn test_valid_transitions() {
        assert!(Phase::Loading.can_transition_to(Phase::Ready));
        assert!(Phase::Loading.can_transition_to(Phase::FailedRetryable));
        assert!(Phase::FailedRetryable.can_transition_to(Phase::Loading));
        assert!(Phase::FailedRetryable.can_transition_to(Phase::FailedTerminal));
        assert!(Phase::FailedTerminal.can_transition_to(Phase::Loading));
        assert!(Phase::Ready.can_transition_to(Phase::Loading));
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!Phase::Loading.can_transition_to(Phase::FailedTerminal));
        assert!(!Phase::FailedTerminal.can_transition_to(Phase::Ready));
        assert!(!Phase::NoSource.can_transition_to(Phase::Loading));
        assert!(!Phase::Ready.can_transition_to(Phase::FailedRetryable));
    }

    #[test]
    fn test_phase_flags() {
        assert!(Phase::FailedTerminal.is_failed());
        assert!(!Phase::NoSource.is_failed());
    }

    #[test]
    fn test_phase_serializes_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&Phase::FailedTerminal).unwrap(),
            "\"FAILED_TERMINAL\""
        );
    }
}
