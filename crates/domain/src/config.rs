//! Configuration structures
//!
//! Plain data, supplied at wiring time and never mutated afterwards. Loading
//! from the environment or from files lives in `feedline-infra::config`.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BREAKER_COOLDOWN_MS, DEFAULT_BREAKER_FAILURES, DEFAULT_LOG_LEVEL,
    DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_INITIAL_DELAY_MS,
    DEFAULT_RETRY_MULTIPLIER, DEFAULT_TIMEOUT_MS,
};
use crate::errors::{FeedlineError, Result};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub repository: RepositoryConfig,
    pub resilience: ResilienceConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Validate every section
    ///
    /// # Errors
    /// Returns `FeedlineError::Config` describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        self.repository.validate()?;
        self.resilience.validate()
    }
}

/// Which data source backs the news repository
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepoKind {
    /// Bundled local data only
    #[default]
    Mock,
    /// Remote API, failing over to local data
    Remote,
}

impl fmt::Display for RepoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepoKind::Mock => write!(f, "mock"),
            RepoKind::Remote => write!(f, "remote"),
        }
    }
}

impl FromStr for RepoKind {
    type Err = FeedlineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "remote" => Ok(Self::Remote),
            other => Err(FeedlineError::Config(format!(
                "Invalid repository kind '{other}' (expected 'mock' or 'remote')"
            ))),
        }
    }
}

/// Data source configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    pub kind: RepoKind,
    /// Base URL of the news API, required in remote mode
    pub api_base_url: String,
    /// Sent verbatim as the `Authorization` header when present
    #[serde(skip_serializing)]
    pub api_token: Option<String>,
    /// Transport-level request timeout for the HTTP client
    pub request_timeout_ms: u64,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            kind: RepoKind::Mock,
            api_base_url: String::new(),
            api_token: None,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl RepositoryConfig {
    /// Transport timeout as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.kind == RepoKind::Remote && self.api_base_url.trim().is_empty() {
            return Err(FeedlineError::Config(
                "api_base_url is required when repository kind is 'remote'".to_string(),
            ));
        }
        if self.request_timeout_ms == 0 {
            return Err(FeedlineError::Config(
                "request_timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Resilience pipeline configuration
///
/// A `None` section means the stage is left out of the pipeline entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResilienceConfig {
    /// Per-attempt deadline in milliseconds
    pub timeout_ms: Option<u64>,
    pub retry: Option<RetrySettings>,
    pub circuit_breaker: Option<CircuitBreakerSettings>,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            timeout_ms: Some(DEFAULT_TIMEOUT_MS),
            retry: Some(RetrySettings::default()),
            circuit_breaker: Some(CircuitBreakerSettings::default()),
        }
    }
}

impl ResilienceConfig {
    /// A configuration with every stage disabled
    pub fn disabled() -> Self {
        Self { timeout_ms: None, retry: None, circuit_breaker: None }
    }

    fn validate(&self) -> Result<()> {
        if self.timeout_ms == Some(0) {
            return Err(FeedlineError::Config("timeout_ms must be greater than 0".to_string()));
        }
        if let Some(retry) = &self.retry {
            retry.validate()?;
        }
        if let Some(breaker) = &self.circuit_breaker {
            breaker.validate()?;
        }
        Ok(())
    }
}

/// Retry stage settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Total tries including the first
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub multiplier: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RETRY_ATTEMPTS,
            initial_delay_ms: DEFAULT_RETRY_INITIAL_DELAY_MS,
            multiplier: DEFAULT_RETRY_MULTIPLIER,
        }
    }
}

impl RetrySettings {
    fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(FeedlineError::Config("retry.max_attempts must be greater than 0".to_string()));
        }
        if !self.multiplier.is_finite() || self.multiplier < 0.0 {
            return Err(FeedlineError::Config(format!(
                "retry.multiplier must be a finite, non-negative number (got {})",
                self.multiplier
            )));
        }
        Ok(())
    }
}

/// Circuit breaker stage settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerSettings {
    pub failure_threshold: u32,
    pub cooldown_ms: u64,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self { failure_threshold: DEFAULT_BREAKER_FAILURES, cooldown_ms: DEFAULT_BREAKER_COOLDOWN_MS }
    }
}

impl CircuitBreakerSettings {
    fn validate(&self) -> Result<()> {
        if self.failure_threshold == 0 {
            return Err(FeedlineError::Config(
                "circuit_breaker.failure_threshold must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: DEFAULT_LOG_LEVEL.to_string(), json: false }
    }
}
