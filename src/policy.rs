//! Failure policies deciding when a closed gate trips.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::error::ConfigError;
use crate::metrics::WindowMetrics;

/// Default threshold for the count-based policies.
pub const DEFAULT_FAIL_THRESHOLD: u64 = 10;

/// Default failure rate for [`FailurePolicy::FailureRate`].
pub const DEFAULT_FAIL_RATE: f64 = 0.6;

/// Default minimum sample size for [`FailurePolicy::FailureRate`].
pub const DEFAULT_MIN_CALLS: u64 = 10;

/// Rule that decides, from the current window, whether the gate should trip.
///
/// Evaluated only while closed and only right after a failing outcome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FailurePolicy {
    /// Trips once the window holds `threshold` failures.
    AbsoluteFailure {
        /// Failures needed to trip.
        threshold: u64,
    },

    /// Trips once `threshold` failures arrive back to back.
    ConsecutiveFailure {
        /// Failure streak needed to trip.
        threshold: u64,
    },

    /// Trips once at least `min_calls` outcomes were recorded and the
    /// failure rate reaches `rate`.
    FailureRate {
        /// Failure rate in `(0, 1]`.
        rate: f64,
        /// Minimum sample size before the rate is considered.
        min_calls: u64,
    },
}

impl FailurePolicy {
    /// Absolute failure count policy.
    pub fn absolute(threshold: u64) -> Self {
        FailurePolicy::AbsoluteFailure { threshold }
    }

    /// Consecutive failure count policy.
    pub fn consecutive(threshold: u64) -> Self {
        FailurePolicy::ConsecutiveFailure { threshold }
    }

    /// Failure rate policy.
    pub fn failure_rate(rate: f64, min_calls: u64) -> Self {
        FailurePolicy::FailureRate { rate, min_calls }
    }

    /// Returns the selector for this policy.
    pub fn kind(&self) -> PolicyKind {
        match self {
            FailurePolicy::AbsoluteFailure { .. } => PolicyKind::AbsoluteFailure,
            FailurePolicy::ConsecutiveFailure { .. } => PolicyKind::ConsecutiveFailure,
            FailurePolicy::FailureRate { .. } => PolicyKind::FailureRate,
        }
    }

    /// Determines if the gate should trip open based on the window.
    pub fn should_trip(&self, metrics: &WindowMetrics) -> bool {
        match *self {
            FailurePolicy::AbsoluteFailure { threshold } => metrics.fails >= threshold,
            FailurePolicy::ConsecutiveFailure { threshold } => {
                metrics.consecutive_fails >= threshold
            }
            FailurePolicy::FailureRate { rate, min_calls } => {
                metrics.total >= min_calls && metrics.failure_rate() >= rate
            }
        }
    }

    /// Checks the policy parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            FailurePolicy::AbsoluteFailure { threshold }
            | FailurePolicy::ConsecutiveFailure { threshold } => {
                if threshold == 0 {
                    return Err(ConfigError::ZeroThreshold);
                }
            }
            FailurePolicy::FailureRate { rate, min_calls } => {
                // NaN fails both comparisons and lands here too.
                if !(rate > 0.0 && rate <= 1.0) {
                    return Err(ConfigError::RateOutOfRange(rate));
                }
                if min_calls == 0 {
                    return Err(ConfigError::ZeroMinCalls);
                }
            }
        }
        Ok(())
    }
}

impl Default for FailurePolicy {
    fn default() -> Self {
        FailurePolicy::absolute(DEFAULT_FAIL_THRESHOLD)
    }
}

impl From<PolicyKind> for FailurePolicy {
    fn from(kind: PolicyKind) -> Self {
        match kind {
            PolicyKind::AbsoluteFailure => FailurePolicy::absolute(DEFAULT_FAIL_THRESHOLD),
            PolicyKind::ConsecutiveFailure => FailurePolicy::consecutive(DEFAULT_FAIL_THRESHOLD),
            PolicyKind::FailureRate => {
                FailurePolicy::failure_rate(DEFAULT_FAIL_RATE, DEFAULT_MIN_CALLS)
            }
        }
    }
}

/// Names one of the policy variants, e.g. when read from a settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyKind {
    /// See [`FailurePolicy::AbsoluteFailure`].
    AbsoluteFailure,
    /// See [`FailurePolicy::ConsecutiveFailure`].
    ConsecutiveFailure,
    /// See [`FailurePolicy::FailureRate`].
    FailureRate,
}

impl PolicyKind {
    /// Canonical selector text.
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyKind::AbsoluteFailure => "absolute_failure",
            PolicyKind::ConsecutiveFailure => "consecutive_failure",
            PolicyKind::FailureRate => "failure_rate",
        }
    }
}

impl Display for PolicyKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "absolute_failure" | "fail" => Ok(PolicyKind::AbsoluteFailure),
            "consecutive_failure" | "continuous_fail" => Ok(PolicyKind::ConsecutiveFailure),
            "failure_rate" | "fail_rate" => Ok(PolicyKind::FailureRate),
            _ => Err(ConfigError::UnknownPolicy(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(outcomes: &[bool]) -> WindowMetrics {
        let mut m = WindowMetrics::new();
        for &ok in outcomes {
            if ok {
                m.on_success();
            } else {
                m.on_fail();
            }
        }
        m
    }

    #[test]
    fn absolute_counts_all_failures_in_window() {
        let policy = FailurePolicy::absolute(3);
        assert!(!policy.should_trip(&window(&[false, true, false])));
        assert!(policy.should_trip(&window(&[false, true, false, true, false])));
    }

    #[test]
    fn consecutive_needs_an_unbroken_streak() {
        let policy = FailurePolicy::consecutive(2);
        assert!(!policy.should_trip(&window(&[false, true, false])));
        assert!(policy.should_trip(&window(&[true, false, false])));
    }

    #[test]
    fn failure_rate_waits_for_min_calls() {
        let policy = FailurePolicy::failure_rate(0.5, 4);
        assert!(!policy.should_trip(&window(&[false, false, false])));
        assert!(policy.should_trip(&window(&[false, false, false, true])));
        assert!(!policy.should_trip(&window(&[false, true, true, true])));
    }

    #[test]
    fn validate_rejects_bad_parameters() {
        assert_eq!(
            FailurePolicy::absolute(0).validate(),
            Err(ConfigError::ZeroThreshold)
        );
        assert_eq!(
            FailurePolicy::consecutive(0).validate(),
            Err(ConfigError::ZeroThreshold)
        );
        assert_eq!(
            FailurePolicy::failure_rate(0.5, 0).validate(),
            Err(ConfigError::ZeroMinCalls)
        );
        assert!(matches!(
            FailurePolicy::failure_rate(1.5, 10).validate(),
            Err(ConfigError::RateOutOfRange(_))
        ));
        assert!(matches!(
            FailurePolicy::failure_rate(0.0, 10).validate(),
            Err(ConfigError::RateOutOfRange(_))
        ));
        assert!(FailurePolicy::failure_rate(1.0, 1).validate().is_ok());
    }

    #[test]
    fn selectors_parse() {
        assert_eq!(
            "failure-rate".parse::<PolicyKind>(),
            Ok(PolicyKind::FailureRate)
        );
        assert_eq!(
            "Consecutive_Failure".parse::<PolicyKind>(),
            Ok(PolicyKind::ConsecutiveFailure)
        );
        assert_eq!("fail".parse::<PolicyKind>(), Ok(PolicyKind::AbsoluteFailure));
        assert_eq!(
            "sliding".parse::<PolicyKind>(),
            Err(ConfigError::UnknownPolicy("sliding".to_string()))
        );
    }

    #[test]
    fn kind_defaults_round_trip() {
        for kind in [
            PolicyKind::AbsoluteFailure,
            PolicyKind::ConsecutiveFailure,
            PolicyKind::FailureRate,
        ] {
            let policy = FailurePolicy::from(kind);
            assert_eq!(policy.kind(), kind);
            assert!(policy.validate().is_ok());
        }
        assert_eq!(
            FailurePolicy::from(PolicyKind::FailureRate),
            FailurePolicy::failure_rate(0.6, 10)
        );
    }
}
