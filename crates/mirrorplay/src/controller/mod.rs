//! Failure monitor and failover controller.
//!
//! The controller watches the load lifecycle of the active source. A failure
//! (explicit error or timeout, treated the same) marks the source as
//! attempted and moves to the other slot once; when no untried alternate is
//! left the session stops in [`Phase::FailedTerminal`] until the viewer acts.
//! Bounding automatic failover by the attempted set means at most two
//! automatic hops, even when neither source is reachable.
//!
//! The manual toggle is independent of that bookkeeping: whenever both slots
//! exist the viewer can switch, including mid-load to cut a slow failover short.

mod events;
mod state;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub use events::{FailoverEvent, FailureCause, SelectionReason};
pub use state::{Phase, SelectionState};

use crate::config::FailoverConfig;
use crate::region::RegionHint;
use crate::selector;
use crate::source::{Content, ContentSource, Slot};
use crate::timer::{TimeoutScheduler, TimerToken};

/// What the presentation layer renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub title: String,
    pub current_source: Option<ContentSource>,
    pub active_slot: Option<Slot>,
    pub phase: Phase,
    /// The "use alternate server" affordance is available.
    pub can_toggle_manually: bool,
    /// The "retry" action is available.
    pub can_retry: bool,
}

/// Source selection state machine for one content item.
pub struct FailoverController<S: TimeoutScheduler> {
    content: Content,
    hint: RegionHint,
    config: FailoverConfig,
    scheduler: S,
    state: SelectionState,
    /// Token of the armed load timeout, if any.
    pending_timer: Option<TimerToken>,
    last_token: Option<TimerToken>,
    automatic_failovers: u32,
    events: Vec<FailoverEvent>,
}

impl<S: TimeoutScheduler> FailoverController<S> {
    /// Create a controller and run the initial selection.
    pub fn new(content: Content, hint: RegionHint, config: FailoverConfig, scheduler: S) -> Self {
        let mut controller = Self {
            content,
            hint,
            config,
            scheduler,
            state: SelectionState::no_source(),
            pending_timer: None,
            last_token: None,
            automatic_failovers: 0,
            events: Vec::new(),
        };
        controller.start(SelectionReason::Initial);
        controller
    }

    // --- Signals ---

    /// The embed surface reports that the active source started rendering.
    pub fn on_load_succeeded(&mut self) {
        if self.state.phase != Phase::Loading {
            debug!(phase = %self.state.phase, "Ignoring load success outside of loading");
            return;
        }

        self.cancel_timer();
        self.set_phase(Phase::Ready);
        if let Some(slot) = self.state.active {
            info!(slot = %slot, title = %self.content.title, "Video source ready");
        }
    }

    /// The embed surface reports an error for the active source.
    pub fn on_load_failed(&mut self) {
        if self.state.phase != Phase::Loading {
            debug!(phase = %self.state.phase, "Ignoring load failure outside of loading");
            return;
        }
        self.handle_failure(FailureCause::Error);
    }

    /// A scheduled load timeout fired.
    ///
    /// Tokens other than the armed one are stale (their source has been
    /// replaced) and never change the phase.
    pub fn on_timeout(&mut self, token: TimerToken) {
        if self.pending_timer != Some(token) {
            debug!(token = %token, pending = ?self.pending_timer, "Ignoring stale load timeout");
            return;
        }
        self.pending_timer = None;

        if self.state.phase != Phase::Loading {
            debug!(token = %token, phase = %self.state.phase, "Load timeout fired outside of loading");
            return;
        }
        self.handle_failure(FailureCause::Timeout);
    }

    // --- Viewer actions ---

    /// Forget failure history and select again from scratch.
    ///
    /// Applies only after failure; returns whether it did.
    pub fn retry(&mut self) -> bool {
        if !self.can_retry() {
            debug!(phase = %self.state.phase, "Retry not available");
            return false;
        }

        info!(title = %self.content.title, "Retrying video sources from scratch");
        self.cancel_timer();
        self.state.attempted.clear();
        self.automatic_failovers = 0;

        match selector::select_initial(&self.content.sources, self.hint) {
            Some(slot) => {
                self.activate(slot, SelectionReason::Retry);
                true
            }
            None => false,
        }
    }

    /// Switch to the other slot regardless of failure history.
    ///
    /// Returns whether a switch happened; it does not when the content item
    /// has fewer than two sources.
    pub fn toggle_source(&mut self) -> bool {
        let Some(current) = self.state.active else {
            debug!("Manual toggle without an active source");
            return false;
        };
        let Some(target) = selector::toggle_target(&self.content.sources, current) else {
            debug!(slot = %current, "Manual toggle without an alternate source");
            return false;
        };

        info!(from = %current, to = %target, "Switching video source manually");
        self.activate(target, SelectionReason::ManualToggle);
        true
    }

    /// Discard all state and start over with a new content item.
    pub fn replace_content(&mut self, content: Content) {
        debug!(title = %content.title, "Replacing content item");
        self.cancel_timer();
        self.content = content;
        self.automatic_failovers = 0;
        self.state = SelectionState::no_source();
        self.start(SelectionReason::Initial);
    }

    /// Store a late region hint for the next selection from scratch.
    pub fn set_region_hint(&mut self, hint: RegionHint) {
        if self.hint != hint {
            debug!(from = %self.hint, to = %hint, "Region hint updated");
            self.hint = hint;
        }
    }

    /// Cancel the pending timer. The controller stays observable but no
    /// timeout will act on it anymore.
    pub fn shutdown(&mut self) {
        self.cancel_timer();
    }

    // --- Observers ---

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn active_slot(&self) -> Option<Slot> {
        self.state.active
    }

    pub fn current_source(&self) -> Option<&ContentSource> {
        self.state
            .active
            .and_then(|slot| self.content.sources.get(slot))
    }

    pub fn attempted(&self) -> &FxHashSet<ContentSource> {
        &self.state.attempted
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn region_hint(&self) -> RegionHint {
        self.hint
    }

    /// Token of the armed load timeout.
    pub fn pending_timer(&self) -> Option<TimerToken> {
        self.pending_timer
    }

    /// Automatic failovers since the last selection from scratch.
    pub fn automatic_failovers(&self) -> u32 {
        self.automatic_failovers
    }

    pub fn can_toggle_manually(&self) -> bool {
        self.state.phase != Phase::NoSource && self.content.sources.has_both()
    }

    pub fn can_retry(&self) -> bool {
        self.state.phase.is_failed()
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            title: self.content.title.clone(),
            current_source: self.current_source().cloned(),
            active_slot: self.state.active,
            phase: self.state.phase,
            can_toggle_manually: self.can_toggle_manually(),
            can_retry: self.can_retry(),
        }
    }

    /// Take the events emitted since the last call.
    pub fn drain_events(&mut self) -> Vec<FailoverEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    // --- Internals ---

    fn start(&mut self, reason: SelectionReason) {
        match selector::select_initial(&self.content.sources, self.hint) {
            Some(slot) => {
                debug!(
                    title = %self.content.title,
                    sources = self.content.sources.present_count(),
                    hint = %self.hint,
                    "Starting source selection"
                );
                self.state = SelectionState::loading(slot);
                self.emit_selected(slot, reason);
                self.arm_timer();
            }
            None => {
                info!(title = %self.content.title, "No video source configured");
                self.state = SelectionState::no_source();
            }
        }
    }

    fn handle_failure(&mut self, cause: FailureCause) {
        self.cancel_timer();
        let Some(slot) = self.state.active else {
            return;
        };
        let Some(source) = self.content.sources.get(slot).cloned() else {
            return;
        };

        warn!(slot = %slot, source = %source, cause = ?cause, "Video source failed to load");
        self.set_phase(Phase::FailedRetryable);
        self.events.push(FailoverEvent::LoadFailed {
            slot,
            source: source.clone(),
            cause,
        });
        self.state.attempted.insert(source);

        match selector::swap(&self.content.sources, slot, &self.state.attempted) {
            Some(target) => {
                self.automatic_failovers += 1;
                info!(from = %slot, to = %target, "Failing over to alternate video source");
                self.activate(target, SelectionReason::Failover);
            }
            None => {
                warn!(
                    attempted = self.state.attempted.len(),
                    title = %self.content.title,
                    "All video sources failed"
                );
                self.events.push(FailoverEvent::Exhausted {
                    attempted: self.state.attempted.len(),
                });
                self.set_phase(Phase::FailedTerminal);
            }
        }
    }

    /// Make `slot` active and start loading it. Cancels the old timer first.
    fn activate(&mut self, slot: Slot, reason: SelectionReason) {
        self.cancel_timer();
        self.state.active = Some(slot);
        self.set_phase(Phase::Loading);
        self.emit_selected(slot, reason);
        self.arm_timer();
    }

    fn emit_selected(&mut self, slot: Slot, reason: SelectionReason) {
        if let Some(source) = self.content.sources.get(slot) {
            info!(slot = %slot, source = %source, reason = ?reason, "Video source selected");
            self.events.push(FailoverEvent::SourceSelected {
                slot,
                source: source.clone(),
                reason,
            });
        }
    }

    fn set_phase(&mut self, to: Phase) {
        let from = self.state.phase;
        if !from.can_transition_to(to) {
            // Every caller guards its transition; reaching this is a bug.
            warn!(from = %from, to = %to, "Unexpected phase transition");
        }
        if from != to {
            self.events.push(FailoverEvent::PhaseChanged { from, to });
        }
        self.state.phase = to;
    }

    fn arm_timer(&mut self) {
        let Some(provider) = self.current_source().map(ContentSource::provider) else {
            return;
        };
        let token = self
            .last_token
            .map(TimerToken::next)
            .unwrap_or_else(TimerToken::first);
        let timeout = self.config.load_timeout(provider);

        debug!(token = %token, provider = %provider, timeout_ms = timeout.as_millis() as u64, "Arming load timeout");
        self.last_token = Some(token);
        self.pending_timer = Some(token);
        self.scheduler.schedule(token, timeout);
    }

    fn cancel_timer(&mut self) {
        if let Some(token) = self.pending_timer.take() {
            debug!(token = %token, "Cancelling load timeout");
            self.scheduler.cancel(token);
        }
    }
}

impl<S: TimeoutScheduler> Drop for FailoverController<S> {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

impl<S: TimeoutScheduler> std::fmt::Debug for FailoverController<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FailoverController")
            .field("title", &self.content.title)
            .field("hint", &self.hint)
            .field("state", &self.state)
            .field("pending_timer", &self.pending_timer)
            .finish()
    }
}
