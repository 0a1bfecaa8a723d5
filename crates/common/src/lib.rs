//! Generic building blocks shared across Feedline crates.
//!
//! Everything here is domain-agnostic: the resilience stages know nothing
//! about news, HTTP or configuration files.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod resilience;

pub use resilience::{
    BackoffStrategy, CircuitBreaker, CircuitState, ResilienceError, ResilienceFailure,
    ResiliencePipeline, ResiliencePipelineBuilder, RetryPolicy, TimeoutGuard,
};
