//! Error types used throughout the application

use std::time::Duration;

use feedline_common::resilience::{ConfigError, ResilienceFailure};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Feedline
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum FeedlineError {
    #[error("Request timed out after {limit:?}")]
    Timeout { limit: Duration },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Circuit breaker is open, primary source unavailable")]
    CircuitOpen,

    #[error("Upstream error: {status} - {body}")]
    Upstream { status: u16, body: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl FeedlineError {
    /// Whether a 4xx upstream status is one that retrying cannot fix.
    ///
    /// 408 (request timeout) and 429 (too many requests) are transient.
    fn is_permanent_status(status: u16) -> bool {
        (400..500).contains(&status) && status != 408 && status != 429
    }
}

impl ResilienceFailure for FeedlineError {
    fn timed_out(limit: Duration) -> Self {
        Self::Timeout { limit }
    }

    fn circuit_open() -> Self {
        Self::CircuitOpen
    }

    fn is_circuit_open(&self) -> bool {
        matches!(self, Self::CircuitOpen)
    }

    fn is_permanent(&self) -> bool {
        match self {
            Self::Upstream { status, .. } => Self::is_permanent_status(*status),
            Self::Decode(_) | Self::NotFound(_) | Self::Config(_) => true,
            Self::Timeout { .. } | Self::Network(_) | Self::CircuitOpen | Self::Internal(_) => false,
        }
    }
}

impl From<ConfigError> for FeedlineError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value.to_string())
    }
}

/// Result type alias for Feedline operations
pub type Result<T> = std::result::Result<T, FeedlineError>;
