//! Configuration for gates.

use std::sync::Arc;
use std::time::Duration;

use crate::error::ConfigError;
use crate::gate::Gate;
use crate::hook::HookRegistry;
use crate::metrics::{MetricSink, NullMetricSink};
use crate::policy::FailurePolicy;

/// Default length of a closed-state observation window.
pub const DEFAULT_WINDOW_INTERVAL: Duration = Duration::from_secs(1);

/// Default time an open gate waits before admitting probes.
pub const DEFAULT_COOL_DOWN: Duration = Duration::from_secs(1);

/// Default half-open probe budget.
pub const DEFAULT_HALF_OPEN_BUDGET: u64 = 5;

/// Name given to gates that were not named explicitly.
pub const DEFAULT_NAME: &str = "gate";

/// Named settings for a gate, resolved once at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct GateConfig {
    /// Diagnostic label used in errors and logs.
    pub name: String,
    /// How long a closed window stays valid. Zero means windows never expire,
    /// so counts accumulate until the next state transition; this differs on
    /// purpose from rolling a fresh window on every call.
    pub window_interval: Duration,
    /// How long an open gate waits before admitting probes.
    pub cool_down: Duration,
    /// Probes admitted while half-open; also the success streak that closes
    /// the gate.
    pub half_open_budget: u64,
    /// Rule deciding when a closed gate trips.
    pub policy: FailurePolicy,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            window_interval: DEFAULT_WINDOW_INTERVAL,
            cool_down: DEFAULT_COOL_DOWN,
            half_open_budget: DEFAULT_HALF_OPEN_BUDGET,
            policy: FailurePolicy::default(),
        }
    }
}

impl GateConfig {
    /// Checks every setting, failing on the first invalid one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.half_open_budget == 0 {
            return Err(ConfigError::ZeroProbeBudget);
        }
        self.policy.validate()
    }
}

/// Builder for creating gates with custom configurations.
pub struct GateBuilder {
    config: GateConfig,
    metric_sink: Arc<dyn MetricSink>,
    hook_registry: Arc<HookRegistry>,
}

impl Default for GateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GateBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::from_config(GateConfig::default())
    }

    /// Creates a builder seeded from an existing configuration value.
    pub fn from_config(config: GateConfig) -> Self {
        Self {
            config,
            metric_sink: Arc::new(NullMetricSink),
            hook_registry: Arc::new(HookRegistry::new()),
        }
    }

    /// Sets the diagnostic name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Sets the closed-state window length.
    pub fn window_interval(mut self, interval: Duration) -> Self {
        self.config.window_interval = interval;
        self
    }

    /// Sets the cooldown before the gate transitions from open to half-open.
    pub fn cool_down(mut self, duration: Duration) -> Self {
        self.config.cool_down = duration;
        self
    }

    /// Sets the number of probes to allow in half-open state.
    pub fn half_open_budget(mut self, budget: u64) -> Self {
        self.config.half_open_budget = budget;
        self
    }

    /// Sets the failure policy.
    pub fn policy(mut self, policy: FailurePolicy) -> Self {
        self.config.policy = policy;
        self
    }

    /// Sets a metric sink for the gate.
    pub fn metric_sink<M: MetricSink>(mut self, sink: M) -> Self {
        self.metric_sink = Arc::new(sink);
        self
    }

    /// Sets a hook registry for the gate.
    pub fn hooks(mut self, hooks: HookRegistry) -> Self {
        self.hook_registry = Arc::new(hooks);
        self
    }

    /// Builds a new, independently owned gate.
    pub fn build(self) -> Result<Gate, ConfigError> {
        self.config.validate()?;
        Ok(Gate::with_parts(
            self.config,
            self.metric_sink,
            self.hook_registry,
        ))
    }
}
