//! Application constants
//!
//! Defaults applied when configuration leaves a value out.

// Repository
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

// Resilience pipeline
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_INITIAL_DELAY_MS: u64 = 300;
pub const DEFAULT_RETRY_MULTIPLIER: f64 = 2.0;
pub const DEFAULT_BREAKER_FAILURES: u32 = 3;
pub const DEFAULT_BREAKER_COOLDOWN_MS: u64 = 30_000;

// Local fallback source
pub const MOCK_LATENCY_MS: u64 = 50;

// Logging
pub const DEFAULT_LOG_LEVEL: &str = "info";
