//! Error vocabulary shared by every resilience stage.
//!
//! The stages are generic over the caller's error type. Instead of wrapping
//! errors layer by layer, each stage asks the error type to *produce* the two
//! signals it owns (timeout and circuit-open) through [`ResilienceFailure`].
//! A pipeline therefore returns exactly the error type its operation returns,
//! which keeps a decorated repository substitutable for the undecorated one.
//!
//! Callers that have no error type of their own can use [`ResilienceError`],
//! which implements the trait around any source error.

use std::time::Duration;

use thiserror::Error;

/// Errors the resilience stages need to construct and classify.
///
/// Implemented by domain error enums so that timeouts and breaker rejections
/// surface as ordinary variants of that enum.
pub trait ResilienceFailure: std::error::Error + Send + Sync + 'static {
    /// An attempt did not settle within `limit`.
    fn timed_out(limit: Duration) -> Self;

    /// The circuit breaker rejected the call without invoking the operation.
    fn circuit_open() -> Self;

    /// Whether this error is the breaker's own rejection signal.
    fn is_circuit_open(&self) -> bool;

    /// Whether retrying can never help (for example a 4xx upstream response).
    ///
    /// Only consulted by status-aware retry policies; the default retry
    /// policy ignores it.
    fn is_permanent(&self) -> bool {
        false
    }
}

/// Simple configuration error for validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

impl ConfigError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid { message: message.into() }
    }
}

/// Configuration result type using simple config errors
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Generic resilience error wrapping an operation's own error.
#[derive(Debug, Error)]
pub enum ResilienceError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// Circuit breaker is open, rejecting calls
    #[error("Circuit breaker is open, rejecting calls")]
    CircuitOpen,

    /// An attempt timed out
    #[error("Operation timed out after {limit:?}")]
    Timeout { limit: Duration },

    /// The underlying operation failed
    #[error("Operation failed: {source}")]
    OperationFailed {
        #[source]
        source: E,
    },
}

impl<E> ResilienceError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// Wrap an operation error.
    pub fn operation(source: E) -> Self {
        Self::OperationFailed { source }
    }
}

impl<E> ResilienceFailure for ResilienceError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn timed_out(limit: Duration) -> Self {
        Self::Timeout { limit }
    }

    fn circuit_open() -> Self {
        Self::CircuitOpen
    }

    fn is_circuit_open(&self) -> bool {
        matches!(self, Self::CircuitOpen)
    }
}
