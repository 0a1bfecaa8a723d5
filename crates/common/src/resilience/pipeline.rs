//! Fluent assembly of timeout, retry and circuit breaking.
//!
//! Stages always nest the same way, innermost first:
//!
//! ```text
//! CircuitBreaker( Retry( Timeout( operation ) ) )
//! ```
//!
//! Every attempt gets its own timeout window, and the breaker records one
//! outcome per *retry sequence*: a transient error that a later attempt
//! recovers from never counts against the breaker. Stages that were not
//! configured are simply absent from the call path.
//!
//! ```no_run
//! use std::time::Duration;
//! use feedline_common::resilience::{ResilienceError, ResiliencePipeline};
//!
//! # #[derive(Debug, thiserror::Error)] #[error("io")] struct Io;
//! # async fn fetch() -> Result<String, ResilienceError<Io>> { Ok(String::new()) }
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = ResiliencePipeline::<ResilienceError<Io>>::builder()
//!     .timeout(Duration::from_millis(500))
//!     .retry(3)
//!     .circuit_breaker(5, Duration::from_secs(30))
//!     .build()?;
//!
//! let body = pipeline.execute(fetch).await?;
//! # let _ = body; Ok(()) }
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::instrument;

use super::backoff::BackoffStrategy;
use super::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use super::clock::{Clock, SystemClock};
use super::error::{ConfigResult, ResilienceFailure};
use super::retry::{policies, RetryConfig, RetryGuard, RetryPolicy};
use super::timeout::TimeoutGuard;

/// Pending pipeline configuration.
///
/// Nothing is validated until [`build`](Self::build).
pub struct ResiliencePipelineBuilder<E> {
    timeout: Option<Duration>,
    retry: Option<RetryConfig>,
    circuit_breaker: Option<CircuitBreakerConfig>,
    retry_policy: Option<Arc<dyn RetryPolicy<E>>>,
    clock: Option<Arc<dyn Clock>>,
}

impl<E> fmt::Debug for ResiliencePipelineBuilder<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResiliencePipelineBuilder")
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .field("circuit_breaker", &self.circuit_breaker)
            .field("custom_retry_policy", &self.retry_policy.is_some())
            .finish_non_exhaustive()
    }
}

impl<E> Default for ResiliencePipelineBuilder<E> {
    fn default() -> Self {
        Self { timeout: None, retry: None, circuit_breaker: None, retry_policy: None, clock: None }
    }
}

impl<E: ResilienceFailure> ResiliencePipelineBuilder<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-attempt deadline.
    pub fn timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    /// Retry up to `max_attempts` total tries with the default backoff
    /// (300 ms doubling).
    pub fn retry(self, max_attempts: u32) -> Self {
        self.retry_with_backoff(max_attempts, BackoffStrategy::default())
    }

    /// Retry up to `max_attempts` total tries with the given backoff.
    pub fn retry_with_backoff(mut self, max_attempts: u32, backoff: BackoffStrategy) -> Self {
        let jitter = self.retry.as_ref().map(|config| config.jitter).unwrap_or_default();
        self.retry = Some(RetryConfig { max_attempts, backoff, jitter });
        self
    }

    /// Full retry configuration, including jitter.
    pub fn retry_config(mut self, config: RetryConfig) -> Self {
        self.retry = Some(config);
        self
    }

    /// Replace the default retry classification. Ignored without a retry
    /// stage.
    pub fn retry_policy(mut self, policy: Arc<dyn RetryPolicy<E>>) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Open after `failure_threshold` consecutive failed calls and stay open
    /// for `cooldown`.
    pub fn circuit_breaker(mut self, failure_threshold: u32, cooldown: Duration) -> Self {
        self.circuit_breaker = Some(CircuitBreakerConfig { failure_threshold, cooldown });
        self
    }

    /// Time source for the breaker's cooldown.
    pub fn clock(mut self, clock: impl Clock) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Validate every configured stage and assemble the pipeline.
    pub fn build(self) -> ConfigResult<ResiliencePipeline<E>> {
        let timeout = self.timeout.map(TimeoutGuard::new).transpose()?;

        let retry = match self.retry {
            Some(config) => {
                let policy = self.retry_policy.unwrap_or_else(|| Arc::new(policies::RetryUnlessCircuitOpen));
                Some(RetryGuard::with_policy(config, policy)?)
            }
            None => None,
        };

        let breaker = match self.circuit_breaker {
            Some(config) => {
                let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
                Some(CircuitBreaker::with_shared_clock(config, clock)?)
            }
            None => None,
        };

        Ok(ResiliencePipeline { timeout, retry, breaker })
    }
}

/// An assembled pipeline.
///
/// Owns its circuit breaker, so all calls through one pipeline share breaker
/// state. Share the pipeline by reference or `Arc`, not by rebuilding it.
pub struct ResiliencePipeline<E> {
    timeout: Option<TimeoutGuard>,
    retry: Option<RetryGuard<E>>,
    breaker: Option<CircuitBreaker>,
}

impl<E> fmt::Debug for ResiliencePipeline<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResiliencePipeline")
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .field("breaker", &self.breaker)
            .finish()
    }
}

impl<E: ResilienceFailure> ResiliencePipeline<E> {
    /// Start configuring a pipeline
    pub fn builder() -> ResiliencePipelineBuilder<E> {
        ResiliencePipelineBuilder::new()
    }

    /// Run `operation` through every configured stage.
    ///
    /// `operation` is invoked once per attempt. Errors come back in the
    /// operation's own error type; the only substitutions are the timeout and
    /// circuit-open variants produced by the stages themselves.
    #[instrument(skip_all, name = "resilience_pipeline")]
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let timeout = self.timeout.as_ref();
        let mut attempt = move || {
            let call = operation();
            async move {
                match timeout {
                    Some(guard) => guard.execute(call).await,
                    None => call.await,
                }
            }
        };

        let retried = async move {
            match &self.retry {
                Some(retry) => retry.execute(attempt).await,
                None => attempt().await,
            }
        };

        match &self.breaker {
            Some(breaker) => breaker.execute(|| retried).await,
            None => retried.await,
        }
    }

    /// The pipeline's breaker, if one was configured
    pub fn circuit_breaker(&self) -> Option<&CircuitBreaker> {
        self.breaker.as_ref()
    }

    /// The per-attempt limit, if a timeout stage was configured
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(|guard| guard.limit())
    }

    /// The retry configuration, if a retry stage was configured
    pub fn retry_config(&self) -> Option<&RetryConfig> {
        self.retry.as_ref().map(RetryGuard::config)
    }
}
