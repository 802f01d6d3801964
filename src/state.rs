//! Gate state vocabulary.

use std::fmt::{self, Display, Formatter};

/// Represents the possible states of a gate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum State {
    /// Gate is closed and operations are allowed.
    #[default]
    Closed,

    /// Gate is open and operations are rejected.
    Open,

    /// Gate is admitting a limited number of probe calls to test recovery.
    HalfOpen,
}

impl State {
    /// Lowercase label used in logs and metric sinks.
    pub fn as_str(&self) -> &'static str {
        match self {
            State::Closed => "closed",
            State::Open => "open",
            State::HalfOpen => "half-open",
        }
    }
}

impl Display for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single state change observed by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// State before the change.
    pub from: State,
    /// State after the change.
    pub to: State,
    /// Window batch started by the change.
    pub batch: u64,
}
