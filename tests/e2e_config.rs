// ddlog - tests/e2e_config.rs
//
// End-to-end tests for config discovery and loading against real files in
// temporary directories.

use ddlog::core::pattern::{Clusterer, LogMine};
use ddlog::platform::config::{load_config, load_first};
use ddlog::util::error::ConfigError;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

// =============================================================================
// Helpers
// =============================================================================

fn write(dir: &TempDir, rel: &str, content: &str) -> PathBuf {
    let path = dir.path().join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

const MINIMAL: &str = r#"{ "apiKey": "api-123", "appKey": "app-456" }"#;

// =============================================================================
// Discovery E2E
// =============================================================================

/// An explicit path is loaded and defaults fill every optional setting.
#[test]
fn e2e_explicit_path_with_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "ddlog.json", MINIMAL);

    let (config, warnings) = load_config(Some(path.as_path())).unwrap();

    assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
    assert_eq!(config.path, path);
    assert_eq!(config.api_key, "api-123");
    assert_eq!(config.app_key, "app-456");
    assert_eq!(
        config.endpoint,
        "https://api.datadoghq.com/api/v1/logs-queries/list"
    );
    assert_eq!(config.request_timeout, None);
    assert_eq!(config.tail_poll_interval, Duration::from_secs(30));
    assert_eq!(config.tail_overlap_secs, 5);
    assert_eq!(config.tail_retry_budget, 5);
    assert_eq!(config.log_level, None);
}

/// An explicit path that does not exist is NotFound; no fallback is tried.
#[test]
fn e2e_explicit_missing_path_not_found() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.json");

    match load_config(Some(missing.as_path())) {
        Err(ConfigError::NotFound { searched }) => assert_eq!(searched, vec![missing]),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

/// The first existing candidate wins.
#[test]
fn e2e_first_existing_candidate_wins() {
    let dir = TempDir::new().unwrap();
    let local = dir.path().join("config.json");
    let home = write(
        &dir,
        ".ddlog/config.json",
        r#"{ "apiKey": "home", "appKey": "home-app" }"#,
    );

    let (config, _) = load_first(&[local.clone(), home.clone()]).unwrap();
    assert_eq!(config.api_key, "home");

    write(&dir, "config.json", MINIMAL);
    let (config, _) = load_first(&[local.clone(), home]).unwrap();
    assert_eq!(config.api_key, "api-123");
    assert_eq!(config.path, local);
}

/// No candidate exists: every searched path is reported.
#[test]
fn e2e_nothing_found_lists_searched_paths() {
    let dir = TempDir::new().unwrap();
    let candidates = vec![dir.path().join("a.json"), dir.path().join("b.json")];

    let err = load_first(&candidates).unwrap_err();
    let message = err.to_string();
    assert!(matches!(err, ConfigError::NotFound { .. }));
    assert!(message.contains("a.json") && message.contains("b.json"), "{message}");
}

// =============================================================================
// Loading E2E
// =============================================================================

#[test]
fn e2e_malformed_json() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "config.json", r#"{ "apiKey": "#);

    let err = load_config(Some(path.as_path())).unwrap_err();
    assert!(matches!(err, ConfigError::JsonParse { .. }), "got {err:?}");
    assert!(err.to_string().contains("config.json"));
}

/// A full config with every optional section in range.
#[test]
fn e2e_full_config() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "config.json",
        r#"{
            "apiKey": "api-123",
            "appKey": "app-456",
            "site": "datadoghq.eu",
            "requestTimeoutSecs": 20,
            "tail": { "pollIntervalSecs": 10, "overlapSecs": 15, "retryBudget": 8 },
            "logging": { "level": "DEBUG" },
            "patterns": { "variables": { "ticket": "^TICKET-[0-9]+$" } }
        }"#,
    );

    let (config, warnings) = load_config(Some(path.as_path())).unwrap();

    assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
    assert_eq!(
        config.endpoint,
        "https://api.datadoghq.eu/api/v1/logs-queries/list"
    );
    assert_eq!(config.request_timeout, Some(Duration::from_secs(20)));
    assert_eq!(config.tail_poll_interval, Duration::from_secs(10));
    assert_eq!(config.tail_overlap_secs, 15);
    assert_eq!(config.tail_retry_budget, 8);
    assert_eq!(config.log_level.as_deref(), Some("debug"));

    // Configured variables replace the built-in set.
    let miner = LogMine::new(&config.pattern_variables).unwrap();
    let summary = miner
        .cluster(
            &["closed TICKET-1 in 5s".to_string(), "closed TICKET-22 in 5s".to_string()],
            0,
        )
        .unwrap();
    assert_eq!(summary.clusters.len(), 1);
    assert_eq!(summary.clusters[0].pattern_text(), "closed <ticket> in 5s");
}
