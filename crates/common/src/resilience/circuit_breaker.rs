//! Consecutive-failure circuit breaker.
//!
//! # States
//!
//! - **Closed**: calls pass through. A success resets the consecutive-failure
//!   counter; a failure increments it and opens the breaker once it reaches
//!   `failure_threshold`.
//! - **Open**: calls are rejected with `E::circuit_open()` without invoking
//!   the operation. There is no background timer: the first call that arrives
//!   after `cooldown` has elapsed moves the breaker to half-open and becomes
//!   the trial.
//! - **HalfOpen**: exactly one trial call is in flight. Success closes the
//!   breaker, failure re-opens it with the cooldown measured from the failure.
//!
//! # Concurrency
//!
//! All state lives in one [`Mutex`]; every admission and every recorded
//! outcome is a single critical section and the lock is never held across an
//! `.await`. Callers that arrive while a trial is in flight are rejected as if
//! the breaker were open.
//!
//! Every transition bumps a generation counter. An admitted call remembers the
//! generation it was admitted under, and its outcome is ignored if the breaker
//! has moved on in the meantime (for example a slow closed-state call that
//! finishes after the breaker already opened). A trial whose future is dropped
//! before settling gives its slot back, leaving the breaker half-open for the
//! next caller.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};

use super::clock::{Clock, SystemClock};
use super::error::{ConfigError, ConfigResult, ResilienceFailure};

/// Default consecutive failures before opening
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

/// Default time spent open before a trial is allowed
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(30);

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Circuit is closed, allowing requests
    Closed,
    /// Circuit is open, rejecting requests
    Open,
    /// Circuit is half-open, admitting a single trial request
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "CLOSED"),
            CircuitState::Open => write!(f, "OPEN"),
            CircuitState::HalfOpen => write!(f, "HALF_OPEN"),
        }
    }
}

/// Configuration for circuit breaker behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit
    pub failure_threshold: u32,
    /// Time to stay open before admitting a trial call
    pub cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self { failure_threshold: DEFAULT_FAILURE_THRESHOLD, cooldown: DEFAULT_COOLDOWN }
    }
}

impl CircuitBreakerConfig {
    /// Create a configuration builder
    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::new()
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.failure_threshold == 0 {
            return Err(ConfigError::invalid("failure_threshold must be greater than 0"));
        }
        Ok(())
    }
}

/// Builder for CircuitBreakerConfig
#[derive(Debug, Default)]
pub struct CircuitBreakerConfigBuilder {
    config: CircuitBreakerConfig,
}

impl CircuitBreakerConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.config.failure_threshold = threshold;
        self
    }

    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.config.cooldown = cooldown;
        self
    }

    pub fn build(self) -> ConfigResult<CircuitBreakerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Point-in-time view of a breaker for monitoring
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerMetrics {
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub calls_admitted: u64,
    pub calls_rejected: u64,
    pub opened_at: Option<Instant>,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    trial_in_flight: bool,
    generation: u64,
    calls_admitted: u64,
    calls_rejected: u64,
}

impl BreakerState {
    fn closed() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            opened_at: None,
            trial_in_flight: false,
            generation: 0,
            calls_admitted: 0,
            calls_rejected: 0,
        }
    }

    fn transition(&mut self, to: CircuitState) {
        self.state = to;
        self.generation = self.generation.wrapping_add(1);
    }

    fn open(&mut self, now: Instant) {
        self.transition(CircuitState::Open);
        self.opened_at = Some(now);
        self.trial_in_flight = false;
    }

    fn close(&mut self) {
        self.transition(CircuitState::Closed);
        self.consecutive_failures = 0;
        self.opened_at = None;
        self.trial_in_flight = false;
    }
}

/// Guards one logical operation (or one repository) against repeated
/// failures.
///
/// A breaker is meant to be owned by a single pipeline and shared by
/// reference; it is deliberately not `Clone`.
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerState>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("CircuitBreaker")
            .field("config", &self.config)
            .field("state", &state.state)
            .field("consecutive_failures", &state.consecutive_failures)
            .finish_non_exhaustive()
    }
}

impl CircuitBreaker {
    /// Create a breaker backed by the system clock
    pub fn new(config: CircuitBreakerConfig) -> ConfigResult<Self> {
        Self::with_clock(config, SystemClock)
    }

    /// Create a breaker with a custom clock (useful for testing)
    pub fn with_clock(config: CircuitBreakerConfig, clock: impl Clock) -> ConfigResult<Self> {
        Self::with_shared_clock(config, Arc::new(clock))
    }

    pub(crate) fn with_shared_clock(
        config: CircuitBreakerConfig,
        clock: Arc<dyn Clock>,
    ) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self { config, inner: Mutex::new(BreakerState::closed()), clock })
    }

    /// The validated configuration
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Run `operation` unless the breaker is rejecting calls.
    ///
    /// Errors count as failures unless [`ResilienceFailure::is_permanent`]
    /// says otherwise: a permanent error means the backend answered, so it
    /// neither opens nor closes the breaker and a trial slot is handed back.
    /// A rejection never invokes the operation and returns `E::circuit_open()`.
    #[instrument(skip_all, fields(state = %self.state()))]
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: ResilienceFailure,
    {
        let Some(permit) = self.try_acquire() else {
            debug!("circuit breaker rejecting call");
            return Err(E::circuit_open());
        };

        let result = operation().await;
        match &result {
            Ok(_) => permit.succeeded(),
            Err(error) if error.is_permanent() => {
                debug!("permanent error, not counted against the breaker");
                drop(permit);
            }
            Err(_) => permit.failed(),
        }
        result
    }

    /// Current state.
    ///
    /// An open breaker whose cooldown has elapsed still reports `Open` until
    /// the next call arrives.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Snapshot of the breaker's counters
    pub fn metrics(&self) -> CircuitBreakerMetrics {
        let state = self.lock();
        CircuitBreakerMetrics {
            state: state.state,
            consecutive_failures: state.consecutive_failures,
            calls_admitted: state.calls_admitted,
            calls_rejected: state.calls_rejected,
            opened_at: state.opened_at,
        }
    }

    /// Force the breaker back to closed, discarding in-flight outcomes
    pub fn reset(&self) {
        self.lock().close();
        info!("circuit breaker manually reset to closed state");
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("circuit breaker state lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn try_acquire(&self) -> Option<Permit<'_>> {
        let mut state = self.lock();

        let trial = match state.state {
            CircuitState::Closed => false,
            CircuitState::Open => {
                let now = self.clock.now();
                let cooled_down = state
                    .opened_at
                    .map_or(true, |opened| now.saturating_duration_since(opened) >= self.config.cooldown);
                if !cooled_down {
                    state.calls_rejected += 1;
                    return None;
                }
                state.transition(CircuitState::HalfOpen);
                debug!("circuit breaker half-open, admitting trial call");
                true
            }
            CircuitState::HalfOpen if state.trial_in_flight => {
                state.calls_rejected += 1;
                return None;
            }
            CircuitState::HalfOpen => true,
        };

        if trial {
            state.trial_in_flight = true;
        }
        state.calls_admitted += 1;
        Some(Permit { breaker: self, generation: state.generation, trial, settled: false })
    }

    fn record_success(&self, generation: u64) {
        let mut state = self.lock();
        if state.generation != generation {
            debug!("ignoring success from a previous breaker generation");
            return;
        }
        match state.state {
            CircuitState::Closed => state.consecutive_failures = 0,
            CircuitState::HalfOpen => {
                state.close();
                info!("circuit breaker closed after successful trial call");
            }
            CircuitState::Open => {}
        }
    }

    fn record_failure(&self, generation: u64) {
        let mut state = self.lock();
        if state.generation != generation {
            debug!("ignoring failure from a previous breaker generation");
            return;
        }
        let now = self.clock.now();
        match state.state {
            CircuitState::Closed => {
                state.consecutive_failures += 1;
                if state.consecutive_failures >= self.config.failure_threshold {
                    state.open(now);
                    warn!(
                        failures = state.consecutive_failures,
                        cooldown_ms = self.config.cooldown.as_millis() as u64,
                        "circuit breaker opened"
                    );
                }
            }
            CircuitState::HalfOpen => {
                state.open(now);
                warn!("circuit breaker re-opened after failed trial call");
            }
            CircuitState::Open => {}
        }
    }

    fn release_trial(&self, generation: u64) {
        let mut state = self.lock();
        if state.generation == generation && state.state == CircuitState::HalfOpen {
            state.trial_in_flight = false;
            debug!("trial call abandoned, slot released");
        }
    }
}

/// Admission ticket for one call.
struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    trial: bool,
    settled: bool,
}

impl Permit<'_> {
    fn succeeded(mut self) {
        self.settled = true;
        self.breaker.record_success(self.generation);
    }

    fn failed(mut self) {
        self.settled = true;
        self.breaker.record_failure(self.generation);
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if self.trial && !self.settled {
            self.breaker.release_trial(self.generation);
        }
    }
}
