//! Per-target circuit breaker (spec §5 "Shared resources").
//!
//! `closed -> open -> half-open`, driven by a consecutive-failure counter.
//! Opens after 5 consecutive failures; probes again (half-open) 30s after
//! opening. One instance guards one outbound target (a Messaging/Integrations
//! base URL or a webhook endpoint).

use std::sync::Mutex;
use std::time::{Duration, Instant};

const FAILURE_THRESHOLD: u32 = 5;
const OPEN_COOLDOWN: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy)]
enum State {
    Closed { consecutive_failures: u32 },
    Open { since: Instant },
    HalfOpen,
}

/// A circuit breaker for one outbound target.
#[derive(Debug)]
pub struct CircuitBreaker {
    state: Mutex<State>,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}

impl CircuitBreaker {
    /// Build a closed breaker.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(State::Closed { consecutive_failures: 0 }),
        }
    }

    /// Whether a call should be attempted right now. Transitions
    /// `open -> half-open` when the cooldown has elapsed.
    pub fn allow(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        match *state {
            State::Closed { .. } | State::HalfOpen => true,
            State::Open { since } => {
                if since.elapsed() >= OPEN_COOLDOWN {
                    *state = State::HalfOpen;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Record a successful call. Closes the breaker unconditionally.
    pub fn record_success(&self) {
        let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *state = State::Closed { consecutive_failures: 0 };
    }

    /// Record a failed call. Opens the breaker once the consecutive-failure
    /// count reaches [`FAILURE_THRESHOLD`]; a failed half-open probe reopens
    /// it immediately.
    pub fn record_failure(&self) {
        let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *state = match *state {
            State::Closed { consecutive_failures } if consecutive_failures + 1 >= FAILURE_THRESHOLD => {
                State::Open { since: Instant::now() }
            }
            State::Closed { consecutive_failures } => State::Closed {
                consecutive_failures: consecutive_failures + 1,
            },
            State::HalfOpen => State::Open { since: Instant::now() },
            State::Open { since } => State::Open { since },
        };
    }

    /// Current state name, for logging/metrics.
    #[must_use]
    pub fn state_name(&self) -> &'static str {
        let state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        match *state {
            State::Closed { .. } => "closed",
            State::Open { .. } => "open",
            State::HalfOpen => "half_open",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_threshold_failures() {
        let cb = CircuitBreaker::new();
        for _ in 0..FAILURE_THRESHOLD - 1 {
            cb.record_failure();
            assert!(cb.allow());
        }
        cb.record_failure();
        assert!(!cb.allow());
        assert_eq!(cb.state_name(), "open");
    }

    #[test]
    fn success_resets_failure_count() {
        let cb = CircuitBreaker::new();
        for _ in 0..FAILURE_THRESHOLD - 1 {
            cb.record_failure();
        }
        cb.record_success();
        for _ in 0..FAILURE_THRESHOLD - 1 {
            cb.record_failure();
            assert!(cb.allow(), "should still be closed after reset");
        }
    }
}
