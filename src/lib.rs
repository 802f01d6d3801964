//! # circuit-gate
//!
//! An in-process request gate that protects a caller from repeatedly
//! invoking a failing downstream operation.
//!
//! A [`Gate`] wraps an arbitrary unit of work, watches whether each call
//! succeeds or fails, and moves between three states:
//!
//! - **Closed**: Normal operation. Calls pass through and outcomes are
//!   counted in a time-bounded window.
//! - **Open**: Calls are rejected with [`GuardError::GateOpen`] without
//!   running the operation.
//! - **Half-Open**: After the cooldown, a limited budget of probe calls is
//!   admitted. Enough consecutive successes close the gate; a single failure
//!   opens it again.
//!
//! When a closed gate trips is decided by a [`FailurePolicy`]: an absolute
//! failure count, a consecutive failure count, or a failure rate over a
//! minimum number of calls.
//!
//! The gate never retries, never sleeps and runs no background timers.
//! Cooldown expiry is discovered by the next admission attempt.
//!
//! ## Basic Usage
//!
//! ```rust
//! use circuit_gate::{FailurePolicy, Gate, GuardError};
//! use std::time::Duration;
//!
//! let gate = Gate::builder()
//!     .name("inventory")
//!     .policy(FailurePolicy::consecutive(3)) // Trip after 3 failures in a row
//!     .cool_down(Duration::from_secs(30)) // Wait 30 seconds before probing
//!     .half_open_budget(2) // 2 probes, 2 successes to close
//!     .build()
//!     .expect("valid gate configuration");
//!
//! match gate.guard(|| -> Result<String, std::io::Error> { Ok("stock: 12".to_string()) }) {
//!     Ok(body) => println!("Call succeeded: {}", body),
//!     Err(err) if err.is_rejection() => println!("Gate refused the call: {}", err),
//!     Err(GuardError::Operation(err)) => println!("Call failed: {}", err),
//!     Err(err) => println!("Other error: {}", err),
//! }
//! ```
//!
//! ## Features
//!
//! - `async` - [`Gate::guard_async`] for futures

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod config;
mod error;
mod gate;
mod hook;
mod metrics;
mod policy;
pub mod prelude;
mod state;

// Re-exports
pub use config::{
    GateBuilder, GateConfig, DEFAULT_COOL_DOWN, DEFAULT_HALF_OPEN_BUDGET, DEFAULT_NAME,
    DEFAULT_WINDOW_INTERVAL,
};
pub use error::{ConfigError, GuardError, GuardResult};
pub use gate::Gate;
pub use hook::HookRegistry;
pub use metrics::{MetricSink, NullMetricSink, WindowMetrics};
pub use policy::{
    FailurePolicy, PolicyKind, DEFAULT_FAIL_RATE, DEFAULT_FAIL_THRESHOLD, DEFAULT_MIN_CALLS,
};
pub use state::{State, Transition};
