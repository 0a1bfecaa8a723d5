//! Logging setup
//!
//! Installs a global `tracing` subscriber. `RUST_LOG` wins over the
//! configured level when set.

use feedline_domain::{FeedlineError, LoggingConfig, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber described by `config`.
///
/// Calling this again after a subscriber is installed is a no-op.
///
/// # Errors
/// Returns `FeedlineError::Config` if `config.level` is not a valid filter
/// directive.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(config)?;

    let json_layer = config.json.then(|| fmt::layer().json().with_target(true));
    let plain_layer = (!config.json).then(|| fmt::layer().with_target(true));

    let installed =
        tracing_subscriber::registry().with(filter).with(json_layer).with(plain_layer).try_init();

    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed, keeping it");
    }
    Ok(())
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level)
        .map_err(|e| FeedlineError::Config(format!("Invalid log level '{}': {e}", config.level)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_is_rejected() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = LoggingConfig { level: "feedline=loud".to_string(), json: false };
        assert!(matches!(build_filter(&config), Err(FeedlineError::Config(_))));
    }

    #[test]
    fn test_init_is_idempotent() {
        let config = LoggingConfig::default();
        assert!(init_tracing(&config).is_ok());
        assert!(init_tracing(&LoggingConfig { json: true, ..config }).is_ok());
    }
}
