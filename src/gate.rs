//! Core gate implementation.
//!
//! All bookkeeping happens under one `RwLock` held only for the admission
//! check and the outcome accounting. The guarded operation always runs with
//! the lock released. Cooldown expiry is never scheduled: the first
//! admission attempt after the cooldown notices it and half-opens the gate.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::config::{GateBuilder, GateConfig};
use crate::error::{ConfigError, GuardError, GuardResult};
use crate::hook::HookRegistry;
use crate::metrics::{MetricSink, WindowMetrics};
use crate::policy::FailurePolicy;
use crate::state::{State, Transition};

/// Mutable state shared by all callers, guarded by `GateInner::core`.
#[derive(Debug)]
struct GateCore {
    state: State,
    opened_at: Option<Instant>,
    metrics: WindowMetrics,
    /// Half-open probes admitted but not yet recorded.
    probes_in_flight: u64,
}

impl GateCore {
    fn new(config: &GateConfig, now: Instant) -> Self {
        let mut core = Self {
            state: State::Closed,
            opened_at: None,
            metrics: WindowMetrics::new(),
            probes_in_flight: 0,
        };
        core.roll_window(config, now);
        core
    }

    /// Starts a fresh closed window ending `window_interval` after `now`.
    fn roll_window(&mut self, config: &GateConfig, now: Instant) {
        self.metrics.reset();
        if !config.window_interval.is_zero() {
            self.metrics.expires_at = now.checked_add(config.window_interval);
        }
    }

    fn cool_down_elapsed(&self, config: &GateConfig, now: Instant) -> bool {
        match self.opened_at {
            Some(at) => at
                .checked_add(config.cool_down)
                .is_some_and(|ready| ready < now),
            None => true,
        }
    }

    /// Moves to `to`, resetting the window. Self-transitions change nothing.
    fn transition(&mut self, config: &GateConfig, to: State, now: Instant) -> Option<Transition> {
        if self.state == to {
            return None;
        }

        let from = self.state;
        self.state = to;
        self.probes_in_flight = 0;
        match to {
            State::Closed => self.roll_window(config, now),
            State::Open => {
                self.metrics.reset();
                self.opened_at = Some(now);
            }
            State::HalfOpen => self.metrics.reset(),
        }

        Some(Transition {
            from,
            to,
            batch: self.metrics.batch,
        })
    }
}

/// Receipt for an admitted call, handed back when its outcome is recorded.
///
/// A probe ticket dropped without a recorded outcome (cancelled future, panic
/// in a hook) gives its half-open slot back.
struct Ticket<'a> {
    gate: &'a Gate,
    batch: u64,
    probe: bool,
}

impl Ticket<'_> {
    /// Disarms the ticket. Returns true if it still held a probe slot.
    fn settle(&mut self) -> bool {
        std::mem::replace(&mut self.probe, false)
    }
}

impl Drop for Ticket<'_> {
    fn drop(&mut self) {
        if !self.settle() {
            return;
        }

        let mut core = self.gate.inner.core.write();
        if core.metrics.batch == self.batch {
            core.probes_in_flight = core.probes_in_flight.saturating_sub(1);
            debug!(
                gate = %self.gate.inner.config.name,
                batch = self.batch,
                "probe abandoned, slot released"
            );
        }
    }
}

enum Admission<'a> {
    Admitted {
        ticket: Ticket<'a>,
        transition: Option<Transition>,
    },
    Rejected(State),
}

/// Inner state of the gate, shared between clones.
struct GateInner {
    config: GateConfig,
    core: RwLock<GateCore>,
    metric_sink: Arc<dyn MetricSink>,
    hooks: Arc<HookRegistry>,
}

/// A gate that wraps function calls to stop callers from repeatedly invoking
/// a failing downstream operation.
///
/// Cloning is cheap and clones share the same state.
#[derive(Clone)]
pub struct Gate {
    inner: Arc<GateInner>,
}

impl Gate {
    /// Creates a gate from a configuration value.
    pub fn new(config: GateConfig) -> Result<Self, ConfigError> {
        GateBuilder::from_config(config).build()
    }

    /// Creates a new builder for customizing a gate.
    pub fn builder() -> GateBuilder {
        GateBuilder::new()
    }

    pub(crate) fn with_parts(
        config: GateConfig,
        metric_sink: Arc<dyn MetricSink>,
        hooks: Arc<HookRegistry>,
    ) -> Self {
        let core = GateCore::new(&config, Instant::now());
        debug!(gate = %config.name, policy = %config.policy.kind(), "gate created");

        Self {
            inner: Arc::new(GateInner {
                config,
                core: RwLock::new(core),
                metric_sink,
                hooks,
            }),
        }
    }

    /// Gets the diagnostic name of the gate.
    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    /// Gets the configuration the gate was built with.
    pub fn config(&self) -> &GateConfig {
        &self.inner.config
    }

    /// Gets the failure policy.
    pub fn policy(&self) -> FailurePolicy {
        self.inner.config.policy
    }

    /// Gets the current state of the gate.
    pub fn state(&self) -> State {
        self.inner.core.read().state
    }

    /// Gets a snapshot of the current window's counters.
    pub fn metrics(&self) -> WindowMetrics {
        self.inner.core.read().metrics
    }

    /// Gets the time of the most recent transition into the open state.
    pub fn opened_at(&self) -> Option<Instant> {
        self.inner.core.read().opened_at
    }

    /// Executes a function guarded by the gate.
    ///
    /// Returns the operation's own result, or a rejection if the gate refused
    /// to run it. A panic inside `f` is contained, counted as a failure and
    /// reported as [`GuardError::Panicked`].
    pub fn guard<F, T, E>(&self, f: F) -> GuardResult<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let ticket = self.before_call()?;

        let start = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(f));
        let duration = start.elapsed();

        self.finish(ticket, outcome, duration)
    }

    /// Forces the gate to the open state. Returns true if the state changed.
    pub fn force_open(&self) -> bool {
        self.force(State::Open)
    }

    /// Forces the gate to the closed state. Returns true if the state changed.
    pub fn force_closed(&self) -> bool {
        self.force(State::Closed)
    }

    fn force(&self, to: State) -> bool {
        let transition = {
            let mut core = self.inner.core.write();
            core.transition(&self.inner.config, to, Instant::now())
        };

        match transition {
            Some(transition) => {
                self.publish(&transition);
                true
            }
            None => false,
        }
    }

    fn before_call<E>(&self) -> Result<Ticket<'_>, GuardError<E>> {
        match self.admit_at(Instant::now()) {
            Admission::Admitted { ticket, transition } => {
                // A panicking hook unwinds through `ticket`, releasing its slot.
                if let Some(transition) = transition {
                    self.publish(&transition);
                }
                Ok(ticket)
            }
            Admission::Rejected(state) => {
                self.inner.metric_sink.record_rejection(state);
                self.inner.hooks.execute_rejected_hook(state);

                let name = self.inner.config.name.clone();
                match state {
                    State::HalfOpen => {
                        debug!(gate = %name, "gate is half-open, dropping request beyond probe budget");
                        Err(GuardError::TooManyProbes {
                            name,
                            budget: self.inner.config.half_open_budget,
                        })
                    }
                    _ => {
                        debug!(gate = %name, "gate is open, dropping request");
                        Err(GuardError::GateOpen { name })
                    }
                }
            }
        }
    }

    fn admit_at(&self, now: Instant) -> Admission<'_> {
        let config = &self.inner.config;
        let mut core = self.inner.core.write();

        let state = core.state;
        let transition = match state {
            State::Closed => {
                if core.metrics.is_expired(now) {
                    core.roll_window(config, now);
                    debug!(gate = %config.name, batch = core.metrics.batch, "window rolled");
                }
                None
            }
            State::Open => {
                if !core.cool_down_elapsed(config, now) {
                    return Admission::Rejected(State::Open);
                }
                core.transition(config, State::HalfOpen, now)
            }
            State::HalfOpen => {
                if core.metrics.total + core.probes_in_flight >= config.half_open_budget {
                    return Admission::Rejected(State::HalfOpen);
                }
                None
            }
        };

        let probe = core.state == State::HalfOpen;
        if probe {
            core.probes_in_flight += 1;
        }

        Admission::Admitted {
            ticket: Ticket {
                gate: self,
                batch: core.metrics.batch,
                probe,
            },
            transition,
        }
    }

    fn record_at(
        &self,
        mut ticket: Ticket<'_>,
        success: bool,
        now: Instant,
    ) -> Option<Transition> {
        let config = &self.inner.config;
        let mut core = self.inner.core.write();

        if ticket.settle() && ticket.batch == core.metrics.batch {
            core.probes_in_flight = core.probes_in_flight.saturating_sub(1);
        }

        if success {
            core.metrics.on_success();
            if core.state == State::HalfOpen
                && core.metrics.consecutive_successes >= config.half_open_budget
            {
                return core.transition(config, State::Closed, now);
            }
            return None;
        }

        core.metrics.on_fail();
        let state = core.state;
        match state {
            State::Closed if config.policy.should_trip(&core.metrics) => {
                debug!(
                    gate = %config.name,
                    total = core.metrics.total,
                    fails = core.metrics.fails,
                    consecutive_fails = core.metrics.consecutive_fails,
                    "failure policy tripped"
                );
                core.transition(config, State::Open, now)
            }
            State::HalfOpen => core.transition(config, State::Open, now),
            _ => None,
        }
    }

    fn finish<T, E>(
        &self,
        ticket: Ticket<'_>,
        outcome: Result<Result<T, E>, Box<dyn Any + Send>>,
        duration: Duration,
    ) -> GuardResult<T, E> {
        let success = matches!(outcome, Ok(Ok(_)));

        let transition = self.record_at(ticket, success, Instant::now());
        self.inner.metric_sink.record_call(success, duration);
        self.inner.hooks.execute_outcome_hook(success);
        if let Some(transition) = transition {
            self.publish(&transition);
        }

        match outcome {
            Ok(result) => result.map_err(GuardError::Operation),
            Err(payload) => {
                let message = panic_message(&*payload);
                warn!(gate = %self.inner.config.name, panic = %message, "guarded operation panicked");
                Err(GuardError::Panicked { message })
            }
        }
    }

    /// Reports a transition to logs, the metric sink and hooks. Called with
    /// the lock released.
    fn publish(&self, transition: &Transition) {
        let name = &self.inner.config.name;
        match transition.to {
            State::Open => {
                warn!(gate = %name, from = %transition.from, batch = transition.batch, "gate opened")
            }
            State::HalfOpen => {
                info!(gate = %name, batch = transition.batch, "cool down passed, gate half-open")
            }
            State::Closed => {
                info!(gate = %name, from = %transition.from, batch = transition.batch, "gate closed")
            }
        }

        self.inner
            .metric_sink
            .record_state_transition(transition.from, transition.to);
        self.inner.hooks.execute_state_transition_hook(transition);
    }
}

impl fmt::Debug for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.inner.core.read();
        f.debug_struct("Gate")
            .field("config", &self.inner.config)
            .field("state", &core.state)
            .field("metrics", &core.metrics)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(feature = "async")]
impl Gate {
    /// Executes an async function guarded by the gate.
    ///
    /// Panics raised while building or polling the future are contained the
    /// same way as in [`Gate::guard`].
    pub async fn guard_async<F, Fut, T, E>(&self, f: F) -> GuardResult<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        use futures::FutureExt;

        let ticket = self.before_call()?;

        let start = Instant::now();
        let outcome = AssertUnwindSafe(async move { f().await })
            .catch_unwind()
            .await;
        let duration = start.elapsed();

        self.finish(ticket, outcome, duration)
    }
}
