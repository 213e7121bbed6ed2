// crates/client-records-config/tests/load_validation.rs
// ============================================================================
// Module: Config Load Validation Tests
// Description: File loading, defaults, overrides, and validation failures.
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::fs;
use std::path::PathBuf;

use client_records_config::ClientRecordsConfig;
use client_records_config::ConfigError;
use client_records_config::LogFormat;
use client_records_store_sqlite::SqliteStoreMode;
use client_records_store_sqlite::SqliteSyncMode;
use tempfile::TempDir;

fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("client-records.toml");
    fs::write(&path, content).unwrap();
    path
}

fn assert_invalid(content: &str, needle: &str) {
    let config = ClientRecordsConfig::from_toml_str(content).unwrap();
    match config.validate() {
        Err(ConfigError::Invalid(message)) => {
            assert!(message.contains(needle), "message {message:?} lacks {needle:?}");
        }
        other => panic!("expected invalid config, got {other:?}"),
    }
}

#[test]
fn empty_document_yields_defaults() {
    let config = ClientRecordsConfig::from_toml_str("").unwrap();
    config.validate().unwrap();
    assert_eq!(config.server.bind, "127.0.0.1:3000");
    assert_eq!(config.server.max_body_bytes, 64 * 1024);
    assert_eq!(config.server.cors_allow_origin, "*");
    assert_eq!(config.store.path, PathBuf::from("clients.db"));
    assert!(config.store.seed_defaults);
    assert_eq!(config.store.journal_mode, SqliteStoreMode::Wal);
    assert_eq!(config.logging.format, LogFormat::Text);
    assert_eq!(config.logging.filter, "info");
    assert_eq!(config.form.source, "Meeting Record Form");
    assert!(config.form.webhook_url.is_none());
}

#[test]
fn full_document_round_trips_into_sqlite_config() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[server]
bind = "0.0.0.0:8080"
max_body_bytes = 1024
cors_allow_origin = "https://forms.example.com"

[store]
path = "data/clients.db"
busy_timeout_ms = 250
journal_mode = "delete"
sync_mode = "normal"
seed_defaults = false

[logging]
format = "json"
filter = "client_records_server=debug"

[form]
service_url = "http://records.internal:3000"
webhook_url = "https://hooks.example.com/catch/1"
source = "Kiosk"
"#,
    );
    let config = ClientRecordsConfig::load(Some(&path)).unwrap();
    assert_eq!(config.server.max_body_bytes, 1024);
    assert_eq!(config.logging.format, LogFormat::Json);
    assert_eq!(config.form.webhook_url.as_deref(), Some("https://hooks.example.com/catch/1"));

    let sqlite = config.store.to_sqlite_config();
    assert_eq!(sqlite.path, PathBuf::from("data/clients.db"));
    assert_eq!(sqlite.busy_timeout_ms, 250);
    assert_eq!(sqlite.journal_mode, SqliteStoreMode::Delete);
    assert_eq!(sqlite.sync_mode, SqliteSyncMode::Normal);
    assert!(!sqlite.seed_defaults);
}

#[test]
fn explicit_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = ClientRecordsConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn oversized_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let padding = "#".repeat(1024 * 1024 + 1);
    let path = write_config(&dir, &padding);
    let err = ClientRecordsConfig::load(Some(&path)).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn unknown_keys_fail_parse() {
    let err = ClientRecordsConfig::from_toml_str("[server]\nport = 3000\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn port_override_replaces_only_the_port() {
    let mut config = ClientRecordsConfig::from_toml_str("[server]\nbind = \"0.0.0.0:3000\"\n").unwrap();
    config.apply_port_override(Some("4100")).unwrap();
    assert_eq!(config.server.bind, "0.0.0.0:4100");
    config.apply_port_override(None).unwrap();
    config.apply_port_override(Some("  ")).unwrap();
    assert_eq!(config.server.bind, "0.0.0.0:4100");
}

#[test]
fn port_override_rejects_non_numeric() {
    let mut config = ClientRecordsConfig::default();
    let err = config.apply_port_override(Some("eighty")).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn invalid_values_fail_closed() {
    assert_invalid("[server]\nbind = \"localhost\"\n", "bind");
    assert_invalid("[server]\nmax_body_bytes = 0\n", "max_body_bytes");
    assert_invalid("[server]\ncors_allow_origin = \"forms.example.com\"\n", "cors_allow_origin");
    assert_invalid("[store]\npath = \"\"\n", "store.path");
    assert_invalid("[store]\nbusy_timeout_ms = 600000\n", "busy_timeout_ms");
    assert_invalid("[logging]\nfilter = \" \"\n", "logging.filter");
    assert_invalid("[form]\nservice_url = \"ftp://x\"\n", "form.service_url");
    assert_invalid("[form]\nwebhook_url = \"\"\n", "form.webhook_url");
    assert_invalid("[form]\nsource = \"\"\n", "form.source");
}
