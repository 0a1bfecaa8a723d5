//! Bounded retry with backoff between attempts.
//!
//! A [`RetryGuard`] runs an operation up to `max_attempts` times. Whether an
//! error is worth another attempt is decided by a pluggable [`RetryPolicy`];
//! the default, [`policies::RetryUnlessCircuitOpen`], retries everything
//! except a breaker rejection. When attempts run out, or the policy says
//! stop, the error of the last attempt is returned unchanged.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use super::backoff::{BackoffStrategy, Jitter};
use super::error::{ConfigError, ConfigResult, ResilienceFailure};

/// Default number of attempts, counting the first one
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Trait for determining whether an error should be retried
pub trait RetryPolicy<E>: Send + Sync {
    /// Decide what to do after `attempt` (1-based) failed with `error`.
    fn should_retry(&self, error: &E, attempt: u32) -> RetryDecision;
}

/// Decision for whether to retry an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the operation with the configured backoff delay
    Retry,
    /// Retry the operation after a custom delay
    RetryAfter(Duration),
    /// Don't retry the operation
    Stop,
}

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total tries including the first one
    pub max_attempts: u32,
    /// Delay schedule between attempts
    pub backoff: BackoffStrategy,
    /// Randomization applied on top of the backoff delay
    pub jitter: Jitter,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: BackoffStrategy::default(),
            jitter: Jitter::None,
        }
    }
}

impl RetryConfig {
    /// Create a configuration builder
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::new()
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_attempts == 0 {
            return Err(ConfigError::invalid("max_attempts must be greater than 0"));
        }
        self.backoff.validate()
    }
}

/// Builder for [`RetryConfig`]
#[derive(Debug, Default)]
pub struct RetryConfigBuilder {
    config: RetryConfig,
}

impl RetryConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts;
        self
    }

    pub fn fixed_backoff(mut self, delay: Duration) -> Self {
        self.config.backoff = BackoffStrategy::Fixed(delay);
        self
    }

    pub fn exponential_backoff(mut self, initial_delay: Duration, multiplier: f64) -> Self {
        self.config.backoff = BackoffStrategy::exponential(initial_delay, multiplier);
        self
    }

    pub fn backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.config.backoff = backoff;
        self
    }

    pub fn jitter(mut self, jitter: Jitter) -> Self {
        self.config.jitter = jitter;
        self
    }

    pub fn build(self) -> ConfigResult<RetryConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Result of a retried call together with what it took to get there.
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    /// Final value or the last attempt's error
    pub result: Result<T, E>,
    /// Attempts actually made
    pub attempts: u32,
    /// Number of backoff sleeps between attempts
    pub backoff_waits: u32,
    /// Sum of all backoff sleeps
    pub total_delay: Duration,
}

impl<T, E> RetryOutcome<T, E> {
    /// Convert outcome to result (discarding statistics)
    pub fn into_result(self) -> Result<T, E> {
        self.result
    }
}

/// Runs an operation up to `max_attempts` times.
pub struct RetryGuard<E> {
    config: RetryConfig,
    policy: Arc<dyn RetryPolicy<E>>,
}

impl<E> fmt::Debug for RetryGuard<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryGuard").field("config", &self.config).finish_non_exhaustive()
    }
}

impl<E: ResilienceFailure> RetryGuard<E> {
    /// Guard using the default [`policies::RetryUnlessCircuitOpen`] policy.
    pub fn new(config: RetryConfig) -> ConfigResult<Self> {
        Self::with_policy(config, Arc::new(policies::RetryUnlessCircuitOpen))
    }

    /// Guard with a custom classification policy.
    pub fn with_policy(config: RetryConfig, policy: Arc<dyn RetryPolicy<E>>) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self { config, policy })
    }

    /// The validated configuration
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `operation` with retries, returning the last error on failure.
    pub async fn execute<F, Fut, T>(&self, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.execute_with_outcome(operation).await.into_result()
    }

    /// Run `operation` with retries and report attempt statistics.
    #[instrument(skip_all, fields(max_attempts = self.config.max_attempts))]
    pub async fn execute_with_outcome<F, Fut, T>(&self, mut operation: F) -> RetryOutcome<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = self.config.max_attempts;
        let mut attempt = 1;
        let mut backoff_waits = 0;
        let mut total_delay = Duration::ZERO;

        loop {
            debug!(attempt, max_attempts, "executing attempt");

            let error = match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, "operation succeeded after retries");
                    }
                    return RetryOutcome { result: Ok(value), attempts: attempt, backoff_waits, total_delay };
                }
                Err(error) => error,
            };

            if attempt >= max_attempts {
                warn!(attempts = attempt, error = %error, "retry attempts exhausted");
                return RetryOutcome { result: Err(error), attempts: attempt, backoff_waits, total_delay };
            }

            let delay = match self.policy.should_retry(&error, attempt) {
                RetryDecision::Stop => {
                    debug!(attempt, error = %error, "error is not retryable");
                    return RetryOutcome { result: Err(error), attempts: attempt, backoff_waits, total_delay };
                }
                RetryDecision::Retry => self.config.jitter.apply(self.config.backoff.delay(attempt)),
                RetryDecision::RetryAfter(delay) => delay,
            };

            debug!(attempt, delay_ms = delay.as_millis() as u64, error = %error, "attempt failed, backing off");
            tokio::time::sleep(delay).await;
            backoff_waits += 1;
            total_delay += delay;
            attempt += 1;
        }
    }
}

/// Pre-defined retry policies for common scenarios
pub mod policies {
    use super::{ResilienceFailure, RetryDecision, RetryPolicy};

    /// Retry everything except a circuit-open rejection.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct RetryUnlessCircuitOpen;

    impl<E: ResilienceFailure> RetryPolicy<E> for RetryUnlessCircuitOpen {
        fn should_retry(&self, error: &E, _attempt: u32) -> RetryDecision {
            if error.is_circuit_open() {
                RetryDecision::Stop
            } else {
                RetryDecision::Retry
            }
        }
    }

    /// Like [`RetryUnlessCircuitOpen`], but also stops on errors the error
    /// type reports as permanent (for example 4xx upstream responses).
    #[derive(Debug, Clone, Copy, Default)]
    pub struct RetryTransient;

    impl<E: ResilienceFailure> RetryPolicy<E> for RetryTransient {
        fn should_retry(&self, error: &E, _attempt: u32) -> RetryDecision {
            if error.is_circuit_open() || error.is_permanent() {
                RetryDecision::Stop
            } else {
                RetryDecision::Retry
            }
        }
    }

    /// Always retry policy - retries on any error
    #[derive(Debug, Clone, Copy, Default)]
    pub struct AlwaysRetry;

    impl<E> RetryPolicy<E> for AlwaysRetry {
        fn should_retry(&self, _error: &E, _attempt: u32) -> RetryDecision {
            RetryDecision::Retry
        }
    }

    /// Never retry policy - never retries
    #[derive(Debug, Clone, Copy, Default)]
    pub struct NeverRetry;

    impl<E> RetryPolicy<E> for NeverRetry {
        fn should_retry(&self, _error: &E, _attempt: u32) -> RetryDecision {
            RetryDecision::Stop
        }
    }

    /// Predicate-based retry policy
    #[derive(Debug)]
    pub struct PredicateRetry<F> {
        predicate: F,
    }

    impl<F> PredicateRetry<F> {
        pub fn new(predicate: F) -> Self {
            Self { predicate }
        }
    }

    impl<F, E> RetryPolicy<E> for PredicateRetry<F>
    where
        F: Fn(&E, u32) -> bool + Send + Sync,
    {
        fn should_retry(&self, error: &E, attempt: u32) -> RetryDecision {
            if (self.predicate)(error, attempt) {
                RetryDecision::Retry
            } else {
                RetryDecision::Stop
            }
        }
    }
}
