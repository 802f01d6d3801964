//! Hook registry for gate events.

use crate::state::{State, Transition};
use parking_lot::RwLock;
use std::sync::Arc;

type HookFn = Arc<dyn Fn() + Send + Sync + 'static>;
type TransitionHookFn = Arc<dyn Fn(&Transition) + Send + Sync + 'static>;
type RejectHookFn = Arc<dyn Fn(State) + Send + Sync + 'static>;

/// A registry for gate event hooks.
///
/// The gate runs hooks after releasing its lock, so a hook may call back
/// into the gate (for example to read [`Gate::state`](crate::Gate::state)).
pub struct HookRegistry {
    on_open: RwLock<Option<TransitionHookFn>>,
    on_close: RwLock<Option<TransitionHookFn>>,
    on_half_open: RwLock<Option<TransitionHookFn>>,
    on_success: RwLock<Option<HookFn>>,
    on_failure: RwLock<Option<HookFn>>,
    on_rejected: RwLock<Option<RejectHookFn>>,
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HookRegistry {
    /// Creates a new empty hook registry.
    pub fn new() -> Self {
        Self {
            on_open: RwLock::new(None),
            on_close: RwLock::new(None),
            on_half_open: RwLock::new(None),
            on_success: RwLock::new(None),
            on_failure: RwLock::new(None),
            on_rejected: RwLock::new(None),
        }
    }

    /// Sets the hook to call when the gate opens.
    pub fn set_on_open<F>(&self, f: F)
    where
        F: Fn(&Transition) + Send + Sync + 'static,
    {
        *self.on_open.write() = Some(Arc::new(f));
    }

    /// Sets the hook to call when the gate closes.
    pub fn set_on_close<F>(&self, f: F)
    where
        F: Fn(&Transition) + Send + Sync + 'static,
    {
        *self.on_close.write() = Some(Arc::new(f));
    }

    /// Sets the hook to call when the gate half-opens.
    pub fn set_on_half_open<F>(&self, f: F)
    where
        F: Fn(&Transition) + Send + Sync + 'static,
    {
        *self.on_half_open.write() = Some(Arc::new(f));
    }

    /// Sets the hook to call when a guarded call succeeds.
    pub fn set_on_success<F>(&self, f: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.on_success.write() = Some(Arc::new(f));
    }

    /// Sets the hook to call when a guarded call fails or panics.
    pub fn set_on_failure<F>(&self, f: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.on_failure.write() = Some(Arc::new(f));
    }

    /// Sets the hook to call when the gate rejects a call.
    pub fn set_on_rejected<F>(&self, f: F)
    where
        F: Fn(State) + Send + Sync + 'static,
    {
        *self.on_rejected.write() = Some(Arc::new(f));
    }

    /// Executes the appropriate hook for a state transition.
    pub(crate) fn execute_state_transition_hook(&self, transition: &Transition) {
        let slot = match transition.to {
            State::Open => &self.on_open,
            State::Closed => &self.on_close,
            State::HalfOpen => &self.on_half_open,
        };
        // Clone out so the hook runs without the registry lock held.
        let hook = slot.read().clone();
        if let Some(hook) = hook {
            hook(transition);
        }
    }

    pub(crate) fn execute_outcome_hook(&self, success: bool) {
        let slot = if success {
            &self.on_success
        } else {
            &self.on_failure
        };
        let hook = slot.read().clone();
        if let Some(hook) = hook {
            hook();
        }
    }

    pub(crate) fn execute_rejected_hook(&self, state: State) {
        let hook = self.on_rejected.read().clone();
        if let Some(hook) = hook {
            hook(state);
        }
    }
}
