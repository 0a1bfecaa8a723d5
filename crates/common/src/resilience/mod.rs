//! Resilience patterns for remote data access
//!
//! This module provides **generic, reusable** decorators for any asynchronous
//! operation returning `Result<T, E>`:
//! - **Timeout**: per-attempt deadline with optional cancellation signalling
//! - **Retry**: bounded attempts with exponential backoff and optional jitter
//! - **Circuit Breaker**: fail fast after repeated failures, one trial call
//!   after the cooldown
//! - **Pipeline**: fluent assembly of the three in a fixed nesting order
//!
//! All stages are generic over the operation's error type through
//! [`ResilienceFailure`], so a decorated call returns the same error type as
//! the undecorated one.

pub mod backoff;
pub mod circuit_breaker;
pub mod clock;
pub mod error;
pub mod pipeline;
pub mod retry;
pub mod timeout;

pub use backoff::{BackoffStrategy, Jitter};
pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerConfigBuilder, CircuitBreakerMetrics,
    CircuitState,
};
pub use clock::{Clock, MockClock, SystemClock};
pub use error::{ConfigError, ConfigResult, ResilienceError, ResilienceFailure};
pub use pipeline::{ResiliencePipeline, ResiliencePipelineBuilder};
pub use retry::{
    policies, RetryConfig, RetryConfigBuilder, RetryDecision, RetryGuard, RetryOutcome,
    RetryPolicy,
};
pub use timeout::TimeoutGuard;
