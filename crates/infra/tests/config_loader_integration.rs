//! Integration tests for configuration loader
//!
//! Tests the end-to-end behavior of loading configuration from files.

use feedline_domain::{FeedlineError, RepoKind};
use feedline_infra::config;
use tempfile::TempDir;

fn write_config(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).expect("Failed to write config file");
    path
}

#[test]
fn test_load_config_from_json_file() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_config(
        &dir,
        "feedline.json",
        r#"{
            "repository": {
                "kind": "remote",
                "api_base_url": "https://news.example.com",
                "api_token": "Bearer integration",
                "request_timeout_ms": 10000
            },
            "resilience": {
                "timeout_ms": 2500,
                "retry": { "max_attempts": 4, "initial_delay_ms": 50, "multiplier": 3.0 },
                "circuit_breaker": { "failure_threshold": 2, "cooldown_ms": 5000 }
            },
            "logging": { "level": "feedline=debug", "json": true }
        }"#,
    );

    let config = config::load_from_file(Some(path)).expect("Failed to load config from JSON file");

    assert_eq!(config.repository.kind, RepoKind::Remote);
    assert_eq!(config.repository.api_base_url, "https://news.example.com");
    assert_eq!(config.repository.api_token.as_deref(), Some("Bearer integration"));
    assert_eq!(config.repository.request_timeout_ms, 10_000);
    assert_eq!(config.resilience.timeout_ms, Some(2500));

    let retry = config.resilience.retry.expect("retry section");
    assert_eq!((retry.max_attempts, retry.initial_delay_ms), (4, 50));

    let breaker = config.resilience.circuit_breaker.expect("breaker section");
    assert_eq!((breaker.failure_threshold, breaker.cooldown_ms), (2, 5000));

    assert_eq!(config.logging.level, "feedline=debug");
    assert!(config.logging.json);
}

#[test]
fn test_load_config_from_toml_file() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_config(
        &dir,
        "config.toml",
        r#"
[repository]
kind = "remote"
api_base_url = "https://news.example.com/v1"

[resilience]
timeout_ms = 800

[resilience.retry]
max_attempts = 2
initial_delay_ms = 10
multiplier = 1.0
"#,
    );

    let config = config::load_from_file(Some(path)).expect("Failed to load config from TOML file");

    assert_eq!(config.repository.kind, RepoKind::Remote);
    assert_eq!(config.resilience.timeout_ms, Some(800));
    assert_eq!(config.resilience.retry.map(|r| r.max_attempts), Some(2));
    // Omitted sections keep their defaults
    assert_eq!(config.resilience.circuit_breaker.map(|b| b.failure_threshold), Some(3));
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_empty_file_yields_defaults() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_config(&dir, "feedline.json", "{}");

    let config = config::load_from_file(Some(path)).expect("Empty object should load");
    assert_eq!(config, feedline_domain::Config::default());
}

#[test]
fn test_load_config_from_nonexistent_file() {
    let result = config::load_from_file(Some("/nonexistent/path/feedline.json".into()));

    match result {
        Err(FeedlineError::Config(msg)) => {
            assert!(msg.contains("not found"), "Error message should mention 'not found'");
        }
        other => panic!("Expected Config error, got {other:?}"),
    }
}

#[test]
fn test_load_config_with_invalid_format() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_config(&dir, "feedline.json", r#"{ "repository": "#);

    match config::load_from_file(Some(path)) {
        Err(FeedlineError::Config(msg)) => {
            assert!(msg.contains("Invalid JSON"), "Error message should mention invalid JSON");
        }
        other => panic!("Expected Config error, got {other:?}"),
    }
}

#[test]
fn test_unknown_repository_kind_is_rejected() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_config(&dir, "feedline.toml", "[repository]\nkind = \"ftp\"\n");

    assert!(matches!(config::load_from_file(Some(path)), Err(FeedlineError::Config(_))));
}
