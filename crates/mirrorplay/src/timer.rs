//! Injectable load-timeout timers.
//!
//! The controller never sleeps. It asks a [`TimeoutScheduler`] to call back
//! with a [`TimerToken`] after a delay, and hands the token to
//! `FailoverController::on_timeout` when it fires. Tokens are strictly
//! increasing per controller, so a late token is recognized as stale even if
//! the scheduler failed to cancel it.

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::trace;

/// Identity of one scheduled load timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(u64);

impl TimerToken {
    pub(crate) fn first() -> Self {
        Self(1)
    }

    pub(crate) fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TimerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Something that can fire a token after a delay.
///
/// At most one token is live per controller; the controller always cancels the
/// live token before scheduling the next one.
pub trait TimeoutScheduler {
    /// Arrange for `token` to be delivered after `after` has elapsed.
    fn schedule(&mut self, token: TimerToken, after: Duration);

    /// Drop `token` if it has not fired yet. Unknown tokens are ignored.
    fn cancel(&mut self, token: TimerToken);
}

/// Deterministic scheduler driven by an explicit clock.
///
/// Time only moves when [`advance`](Self::advance) is called, which returns the
/// tokens that expired in deadline order. Useful for tests and for hosts that
/// already own an event loop and just need to know what is due.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    now: Duration,
    pending: BTreeMap<TimerToken, Duration>,
    scheduled: Vec<(TimerToken, Duration)>,
    cancelled: Vec<TimerToken>,
    leak_cancellations: bool,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scheduler that records cancellations but keeps the timers armed,
    /// simulating a host whose timers cannot be recalled.
    pub fn leaky() -> Self {
        Self {
            leak_cancellations: true,
            ..Self::default()
        }
    }

    /// Current clock value, measured from creation.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Move the clock forward and collect every token that became due.
    pub fn advance(&mut self, by: Duration) -> Vec<TimerToken> {
        self.now += by;
        let mut due: Vec<(TimerToken, Duration)> = self
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= self.now)
            .map(|(token, deadline)| (*token, *deadline))
            .collect();
        due.sort_by_key(|(token, deadline)| (*deadline, *token));

        for (token, _) in &due {
            self.pending.remove(token);
        }
        due.into_iter().map(|(token, _)| token).collect()
    }

    /// Tokens still armed.
    pub fn pending(&self) -> Vec<TimerToken> {
        self.pending.keys().copied().collect()
    }

    /// Deadline of `token`, if it is still armed.
    pub fn deadline(&self, token: TimerToken) -> Option<Duration> {
        self.pending.get(&token).copied()
    }

    /// Every `schedule` call seen, with its delay.
    pub fn scheduled(&self) -> &[(TimerToken, Duration)] {
        &self.scheduled
    }

    /// Every `cancel` call seen.
    pub fn cancelled(&self) -> &[TimerToken] {
        &self.cancelled
    }
}

impl TimeoutScheduler for ManualScheduler {
    fn schedule(&mut self, token: TimerToken, after: Duration) {
        trace!(token = %token, after_ms = after.as_millis() as u64, "Timer scheduled");
        self.scheduled.push((token, after));
        self.pending.insert(token, self.now + after);
    }

    fn cancel(&mut self, token: TimerToken) {
        self.cancelled.push(token);
        if !self.leak_cancellations {
            self.pending.remove(&token);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_increase() {
        let first = TimerToken::first();
        assert!(first.next() > first);
        assert_eq!(first.next().get(), 2);
    }

    #[test]
    fn test_advance_returns_due_tokens_in_deadline_order() {
        let mut scheduler = ManualScheduler::new();
        let a = TimerToken::first();
        let b = a.next();
        scheduler.schedule(a, Duration::from_secs(10));
        scheduler.schedule(b, Duration::from_secs(5));

        assert!(scheduler.advance(Duration::from_secs(4)).is_empty());
        assert_eq!(scheduler.advance(Duration::from_secs(6)), vec![b, a]);
        assert!(scheduler.pending().is_empty());
    }

    #[test]
    fn test_cancel_disarms() {
        let mut scheduler = ManualScheduler::new();
        let token = TimerToken::first();
        scheduler.schedule(token, Duration::from_secs(1));
        scheduler.cancel(token);

        assert!(scheduler.advance(Duration::from_secs(2)).is_empty());
        assert_eq!(scheduler.cancelled(), &[token]);
    }

    #[test]
    fn test_leaky_scheduler_still_fires() {
        let mut scheduler = ManualScheduler::leaky();
        let token = TimerToken::first();
        scheduler.schedule(token, Duration::from_secs(1));
        scheduler.cancel(token);

        assert_eq!(scheduler.advance(Duration::from_secs(1)), vec![token]);
    }
}
