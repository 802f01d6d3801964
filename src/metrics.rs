//! Window counters and metric sinks for the gate.

use std::time::{Duration, Instant};

use crate::state::State;

/// Trait for metrics sinks that can receive gate events.
pub trait MetricSink: Send + Sync + 'static {
    /// Records a state transition event.
    fn record_state_transition(&self, from: State, to: State);

    /// Records a call rejected before it ran, with the state that rejected it.
    fn record_rejection(&self, state: State);

    /// Records a call result.
    fn record_call(&self, success: bool, duration: Duration);
}

/// A null metrics sink that discards all events.
pub struct NullMetricSink;

impl MetricSink for NullMetricSink {
    fn record_state_transition(&self, _from: State, _to: State) {}
    fn record_rejection(&self, _state: State) {}
    fn record_call(&self, _success: bool, _duration: Duration) {}
}

/// Counters describing the current observation window.
///
/// Plain values, no interior locking: the gate mutates them under its own
/// lock and hands out copies as snapshots. `successes + fails == total`
/// holds at all times.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WindowMetrics {
    /// Increments every time a new window begins. Never reset.
    pub batch: u64,
    /// Instant after which a closed window is stale. `None` while open or
    /// half-open, and for closed windows that never expire.
    pub expires_at: Option<Instant>,
    /// Outcomes recorded in this window.
    pub total: u64,
    /// Successful outcomes in this window.
    pub successes: u64,
    /// Failing outcomes in this window.
    pub fails: u64,
    /// Current success streak.
    pub consecutive_successes: u64,
    /// Current failure streak.
    pub consecutive_fails: u64,
}

impl WindowMetrics {
    /// Creates an empty window at batch zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful call.
    pub fn on_success(&mut self) {
        self.total += 1;
        self.successes += 1;
        self.consecutive_successes += 1;
        self.consecutive_fails = 0;
    }

    /// Records a failed call.
    pub fn on_fail(&mut self) {
        self.total += 1;
        self.fails += 1;
        self.consecutive_fails += 1;
        self.consecutive_successes = 0;
    }

    /// Starts a new window: clears every count and bumps the batch.
    pub fn reset(&mut self) {
        self.batch += 1;
        self.expires_at = None;
        self.total = 0;
        self.successes = 0;
        self.fails = 0;
        self.consecutive_successes = 0;
        self.consecutive_fails = 0;
    }

    /// Gets the failure rate of this window, zero when nothing was recorded.
    pub fn failure_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }

        self.fails as f64 / self.total as f64
    }

    /// Returns true if this window has an expiry that lies before `now`.
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at < now)
    }
}
