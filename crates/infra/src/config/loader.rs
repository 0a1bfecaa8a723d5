//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Environment variables, when `FEEDLINE_REPO_KIND` is set
//! 2. Otherwise the first config file found by [`probe_config_paths`]
//! 3. Otherwise built-in defaults (mock repository)
//!
//! Whatever the source, the result is validated before it is returned.
//!
//! ## Environment Variables
//! - `FEEDLINE_REPO_KIND`: `mock` or `remote` (required for env loading)
//! - `FEEDLINE_API_BASE_URL`: Base URL of the news API
//! - `FEEDLINE_API_TOKEN`: Value sent as the `Authorization` header
//! - `FEEDLINE_REQUEST_TIMEOUT_MS`: HTTP transport timeout
//! - `FEEDLINE_TIMEOUT_MS`: Per-attempt deadline (`0` disables the stage)
//! - `FEEDLINE_RETRY_ATTEMPTS`: Total attempts (`0` disables the stage)
//! - `FEEDLINE_RETRY_INITIAL_DELAY_MS`: First backoff delay
//! - `FEEDLINE_RETRY_MULTIPLIER`: Backoff growth factor
//! - `FEEDLINE_BREAKER_FAILURES`: Failures that open the circuit (`0`
//!   disables the stage)
//! - `FEEDLINE_BREAKER_COOLDOWN_MS`: Open duration before a trial call
//! - `FEEDLINE_LOG_LEVEL`: Default log filter
//! - `FEEDLINE_LOG_JSON`: Emit JSON log lines (true/false)
//!
//! Unset optional variables keep their default values.
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./feedline.{json,toml}` or `./config.{json,toml}` (current working
//!    directory)
//! 2. The same names in the parent and grandparent directories
//! 3. The same names relative to the executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use feedline_domain::{Config, FeedlineError, RepoKind, Result};

const CONFIG_FILE_NAMES: [&str; 4] = ["feedline.json", "feedline.toml", "config.json", "config.toml"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `FeedlineError::Config` if:
/// - An environment variable or file has an invalid value
/// - File format is invalid
/// - The loaded configuration fails validation
pub fn load() -> Result<Config> {
    let config = match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            config
        }
        Err(e) if std::env::var_os("FEEDLINE_REPO_KIND").is_some() => return Err(e),
        Err(e) => {
            tracing::debug!(error = ?e, "Environment configuration absent, trying file");
            if probe_config_paths().is_some() {
                load_from_file(None)?
            } else {
                tracing::info!("No configuration found, using defaults");
                Config::default()
            }
        }
    };

    config.validate()?;
    Ok(config)
}

/// Load configuration from environment variables
///
/// `FEEDLINE_REPO_KIND` must be present; every other variable overrides the
/// corresponding default only when set.
///
/// # Errors
/// Returns `FeedlineError::Config` if `FEEDLINE_REPO_KIND` is missing or
/// any variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();
    config.repository.kind = env_var("FEEDLINE_REPO_KIND")?.parse::<RepoKind>()?;

    if let Some(url) = env_opt("FEEDLINE_API_BASE_URL") {
        config.repository.api_base_url = url;
    }
    config.repository.api_token = env_opt("FEEDLINE_API_TOKEN");
    if let Some(ms) = env_parse::<u64>("FEEDLINE_REQUEST_TIMEOUT_MS")? {
        config.repository.request_timeout_ms = ms;
    }

    let resilience = &mut config.resilience;
    if let Some(ms) = env_parse::<u64>("FEEDLINE_TIMEOUT_MS")? {
        resilience.timeout_ms = (ms > 0).then_some(ms);
    }

    if let Some(attempts) = env_parse::<u32>("FEEDLINE_RETRY_ATTEMPTS")? {
        if attempts == 0 {
            resilience.retry = None;
        } else if let Some(retry) = resilience.retry.as_mut() {
            retry.max_attempts = attempts;
        }
    }
    if let Some(retry) = resilience.retry.as_mut() {
        if let Some(ms) = env_parse::<u64>("FEEDLINE_RETRY_INITIAL_DELAY_MS")? {
            retry.initial_delay_ms = ms;
        }
        if let Some(multiplier) = env_parse::<f64>("FEEDLINE_RETRY_MULTIPLIER")? {
            retry.multiplier = multiplier;
        }
    }

    if let Some(failures) = env_parse::<u32>("FEEDLINE_BREAKER_FAILURES")? {
        if failures == 0 {
            resilience.circuit_breaker = None;
        } else if let Some(breaker) = resilience.circuit_breaker.as_mut() {
            breaker.failure_threshold = failures;
        }
    }
    if let Some(breaker) = resilience.circuit_breaker.as_mut() {
        if let Some(ms) = env_parse::<u64>("FEEDLINE_BREAKER_COOLDOWN_MS")? {
            breaker.cooldown_ms = ms;
        }
    }

    if let Some(level) = env_opt("FEEDLINE_LOG_LEVEL") {
        config.logging.level = level;
    }
    config.logging.json = env_bool("FEEDLINE_LOG_JSON", config.logging.json);

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
/// Missing sections and fields take their default values.
///
/// # Errors
/// Returns `FeedlineError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(FeedlineError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            FeedlineError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| FeedlineError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| FeedlineError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| FeedlineError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(FeedlineError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.extend([exe_dir.to_path_buf(), exe_dir.join(".."), exe_dir.join("../..")]);
        }
    }

    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        FeedlineError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Get optional environment variable, treating blank values as unset
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_opt(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| FeedlineError::Config(format!("Invalid value for {key}: {e}")))
        })
        .transpose()
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
