//! Events emitted by the failover controller.

use serde::{Deserialize, Serialize};

use super::state::Phase;
use crate::source::{ContentSource, Slot};

/// Why a source became active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionReason {
    /// First selection for the content item.
    Initial,
    /// Automatic switch after the previous source failed.
    Failover,
    /// Viewer asked for the other server.
    ManualToggle,
    /// Viewer restarted selection from scratch.
    Retry,
}

/// How a load failure was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause {
    /// No success signal arrived within the load window.
    Timeout,
    /// The embed surface reported an error.
    Error,
}

/// Events emitted by the controller, in the order the transitions happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailoverEvent {
    /// A source became active and started loading.
    SourceSelected {
        slot: Slot,
        source: ContentSource,
        reason: SelectionReason,
    },
    /// The phase changed.
    PhaseChanged { from: Phase, to: Phase },
    /// The active source failed to load.
    LoadFailed {
        slot: Slot,
        source: ContentSource,
        cause: FailureCause,
    },
    /// No automatic failover target remains.
    Exhausted {
        /// Number of distinct sources that failed.
        attempted: usize,
    },
}
