//! Re-exports the types most callers need.
//!
//! # Example
//! ```rust,no_run
//! use circuit_gate::prelude::*;
//!
//! let gate = Gate::builder().policy(FailurePolicy::absolute(5)).build().unwrap();
//! let _ = gate.guard(|| Ok::<_, std::io::Error>(()));
//! ```

pub use crate::{FailurePolicy, Gate, GateConfig, GuardError, GuardResult, State};
