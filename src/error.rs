//! Error types for the gate.

use std::error::Error;
use std::fmt::{self, Display, Formatter};

/// Result type for guarded operations.
pub type GuardResult<T, E> = Result<T, GuardError<E>>;

/// Error returned by [`Gate::guard`](crate::Gate::guard).
#[derive(Debug)]
pub enum GuardError<E> {
    /// The gate is open, calls are not permitted.
    GateOpen {
        /// Diagnostic name of the gate.
        name: String,
    },

    /// The gate is half-open and its probe budget is exhausted.
    TooManyProbes {
        /// Diagnostic name of the gate.
        name: String,
        /// Probe budget configured for the gate.
        budget: u64,
    },

    /// The underlying operation failed.
    Operation(E),

    /// The underlying operation panicked. The panic was contained and
    /// recorded as a failing outcome.
    Panicked {
        /// Panic payload rendered as text, when it was a string.
        message: String,
    },
}

impl<E> GuardError<E> {
    /// Returns true if the gate refused the call without running it.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            GuardError::GateOpen { .. } | GuardError::TooManyProbes { .. }
        )
    }

    /// Returns the operation's own error, if that is what this is.
    pub fn into_operation(self) -> Option<E> {
        match self {
            GuardError::Operation(e) => Some(e),
            _ => None,
        }
    }
}

impl<E> Display for GuardError<E>
where
    E: Display,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            GuardError::GateOpen { name } => {
                write!(f, "gate '{}' is open, request dropped", name)
            }
            GuardError::TooManyProbes { name, budget } => write!(
                f,
                "gate '{}' is half-open, probe budget of {} exhausted",
                name, budget
            ),
            GuardError::Operation(e) => write!(f, "Operation error: {}", e),
            GuardError::Panicked { message } => write!(f, "Operation panicked: {}", message),
        }
    }
}

impl<E: Error + 'static> Error for GuardError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            GuardError::Operation(e) => Some(e),
            _ => None,
        }
    }
}

/// Errors raised while constructing a gate. These are fatal at setup time.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The policy selector did not name a known policy.
    UnknownPolicy(String),

    /// A failure-count threshold was zero.
    ZeroThreshold,

    /// The failure-rate policy was given a zero minimum call count.
    ZeroMinCalls,

    /// The failure rate was outside `(0, 1]`.
    RateOutOfRange(f64),

    /// The half-open probe budget was zero.
    ZeroProbeBudget,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnknownPolicy(s) => write!(f, "unknown gate policy '{}'", s),
            ConfigError::ZeroThreshold => write!(f, "failure threshold must be positive"),
            ConfigError::ZeroMinCalls => write!(f, "minimum call count must be positive"),
            ConfigError::RateOutOfRange(r) => {
                write!(f, "failure rate {} is outside (0, 1]", r)
            }
            ConfigError::ZeroProbeBudget => write!(f, "half-open probe budget must be positive"),
        }
    }
}

impl Error for ConfigError {}
