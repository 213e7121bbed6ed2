// crates/client-records-store-sqlite/tests/sqlite_store.rs
// ============================================================================
// Module: SQLite Client Store Tests
// Description: Durability and constraint tests for the SQLite client store.
// Purpose: Validate seeding, uniqueness, round trips, deletion, and close.
// ============================================================================

//! ## Overview
//! Exercises [`SqliteClientStore`] against real database files:
//! - Idempotent seeding of the example clients
//! - `clientId` uniqueness on insert and update
//! - Update/read round trip with strictly advancing `updated_at`
//! - Delete returning the prior row, then `NotFound`
//! - Path safety and schema version checks

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::path::Path;
use std::sync::Arc;
use std::thread;

use client_records_core::ClientFields;
use client_records_core::ClientId;
use client_records_core::ClientStore;
use client_records_core::RecordId;
use client_records_core::StoreError;
use client_records_store_sqlite::SqliteClientStore;
use client_records_store_sqlite::SqliteStoreConfig;
use client_records_store_sqlite::SqliteStoreError;
use client_records_store_sqlite::SqliteStoreMode;
use rusqlite::Connection;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn store_at(path: &Path, seed_defaults: bool) -> SqliteClientStore {
    let mut config = SqliteStoreConfig::at_path(path);
    config.seed_defaults = seed_defaults;
    SqliteClientStore::new(config).expect("open store")
}

fn fresh_store(seed_defaults: bool) -> (TempDir, SqliteClientStore) {
    let dir = TempDir::new().expect("tempdir");
    let store = store_at(&dir.path().join("clients.db"), seed_defaults);
    store.initialize().expect("initialize");
    (dir, store)
}

fn fields(client_id: &str, name: &str, email: &str) -> ClientFields {
    ClientFields {
        client_id: ClientId::new(client_id),
        name: name.to_string(),
        email: email.to_string(),
        phone: None,
    }
}

// ============================================================================
// SECTION: Seeding
// ============================================================================

#[test]
fn initialize_seeds_three_defaults_once() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("clients.db");
    let store = store_at(&path, true);
    assert_eq!(store.initialize().unwrap().seeded, 3);
    assert_eq!(store.initialize().unwrap().seeded, 0);
    store.close().unwrap();

    let reopened = store_at(&path, true);
    assert_eq!(reopened.initialize().unwrap().seeded, 0);
    let mut ids: Vec<String> =
        reopened.list().unwrap().into_iter().map(|record| record.client_id.to_string()).collect();
    ids.sort();
    assert_eq!(ids, vec!["TB-001", "TB-002", "TB-003"]);
}

#[test]
fn initialize_without_seeding_leaves_table_empty() {
    let (_dir, store) = fresh_store(false);
    assert!(store.list().unwrap().is_empty());
    let stats = store.stats().unwrap();
    assert_eq!(stats.total_clients, 0);
    assert!(stats.latest_created_at.is_none());
}

#[test]
fn seeded_phone_and_email_survive_round_trip() {
    let (_dir, store) = fresh_store(true);
    let john = store.get_by_client_id(&ClientId::new("TB-001")).unwrap();
    assert_eq!(john.name, "John Smith");
    assert_eq!(john.email, "john.smith@email.com");
    assert_eq!(john.phone.as_deref(), Some("+44 7700 123456"));
}

// ============================================================================
// SECTION: Uniqueness
// ============================================================================

#[test]
fn duplicate_insert_leaves_single_row() {
    let (_dir, store) = fresh_store(false);
    store.insert(&fields("X-1", "Xavier", "x@example.com")).unwrap();
    let err = store.insert(&fields("X-1", "Other", "o@example.com")).unwrap_err();
    match err {
        StoreError::DuplicateKey {
            client_id,
        } => assert_eq!(client_id.as_str(), "X-1"),
        other => panic!("unexpected error: {other:?}"),
    }
    let rows = store.list().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Xavier");
}

#[test]
fn update_into_existing_client_id_is_rejected_without_change() {
    let (_dir, store) = fresh_store(false);
    let alpha = store.insert(&fields("A-1", "Alpha", "a@example.com")).unwrap();
    store.insert(&fields("B-1", "Beta", "b@example.com")).unwrap();
    let err = store.update_by_id(alpha.id, &fields("B-1", "Alpha", "a@example.com")).unwrap_err();
    assert!(matches!(err, StoreError::DuplicateKey { .. }));
    let unchanged = store.get_by_id(alpha.id).unwrap();
    assert_eq!(unchanged.client_id.as_str(), "A-1");
    assert_eq!(unchanged.updated_at, alpha.updated_at);
}

// ============================================================================
// SECTION: Round Trips
// ============================================================================

#[test]
fn update_then_read_returns_new_fields_and_later_timestamp() {
    let (_dir, store) = fresh_store(false);
    let created = store.insert(&fields("U-1", "Una", "una@example.com")).unwrap();
    let mut replacement = fields("U-1", "Una Updated", "una2@example.com");
    replacement.phone = Some("+44 1".to_string());
    let updated = store.update_by_client_id(&ClientId::new("U-1"), &replacement).unwrap();
    assert_eq!(updated.id, created.id);
    assert!(updated.updated_at > updated.created_at);
    assert_eq!(updated.created_at, created.created_at);

    let read = store.get_by_id(created.id).unwrap();
    assert_eq!(read, updated);
    assert_eq!(read.phone.as_deref(), Some("+44 1"));
}

#[test]
fn update_can_rename_client_id() {
    let (_dir, store) = fresh_store(false);
    let created = store.insert(&fields("OLD", "Olive", "o@example.com")).unwrap();
    store.update_by_id(created.id, &fields("NEW", "Olive", "o@example.com")).unwrap();
    assert!(matches!(
        store.get_by_client_id(&ClientId::new("OLD")).unwrap_err(),
        StoreError::NotFound
    ));
    assert_eq!(store.get_by_client_id(&ClientId::new("NEW")).unwrap().id, created.id);
}

#[test]
fn update_missing_row_is_not_found() {
    let (_dir, store) = fresh_store(false);
    let err = store.update_by_id(RecordId::new(404), &fields("N-1", "N", "n@example.com"));
    assert!(matches!(err.unwrap_err(), StoreError::NotFound));
}

#[test]
fn delete_returns_prior_row_then_not_found() {
    let (_dir, store) = fresh_store(false);
    let created = store.insert(&fields("D-1", "Dora", "d@example.com")).unwrap();
    let deleted = store.delete_by_client_id(&ClientId::new("D-1")).unwrap();
    assert_eq!(deleted, created);
    assert!(matches!(store.delete_by_id(created.id).unwrap_err(), StoreError::NotFound));
    assert!(matches!(store.get_by_id(created.id).unwrap_err(), StoreError::NotFound));
}

#[test]
fn list_is_ordered_by_name() {
    let (_dir, store) = fresh_store(false);
    store.insert(&fields("C", "Charlie", "c@example.com")).unwrap();
    store.insert(&fields("A", "Alice", "a@example.com")).unwrap();
    store.insert(&fields("B", "Bob", "b@example.com")).unwrap();
    let names: Vec<String> = store.list().unwrap().into_iter().map(|record| record.name).collect();
    assert_eq!(names, vec!["Alice", "Bob", "Charlie"]);
}

#[test]
fn stats_track_latest_insert() {
    let (_dir, store) = fresh_store(false);
    store.insert(&fields("S-1", "First", "f@example.com")).unwrap();
    let second = store.insert(&fields("S-2", "Second", "s@example.com")).unwrap();
    let stats = store.stats().unwrap();
    assert_eq!(stats.total_clients, 2);
    assert_eq!(stats.latest_created_at, Some(second.created_at));
}

#[test]
fn records_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("clients.db");
    let store = store_at(&path, false);
    store.initialize().unwrap();
    let created = store.insert(&fields("P-1", "Persist", "p@example.com")).unwrap();
    store.close().unwrap();

    let reopened = store_at(&path, false);
    assert_eq!(reopened.get_by_id(created.id).unwrap(), created);
}

// ============================================================================
// SECTION: Concurrency
// ============================================================================

#[test]
fn concurrent_duplicate_inserts_admit_exactly_one() {
    let (_dir, store) = fresh_store(false);
    let store = Arc::new(store);
    let handles: Vec<_> = (0 .. 8)
        .map(|index| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                store.insert(&fields("RACE", &format!("Racer {index}"), "r@example.com")).is_ok()
            })
        })
        .collect();
    let winners = handles.into_iter().map(|handle| handle.join().unwrap()).filter(|ok| *ok).count();
    assert_eq!(winners, 1);
    assert_eq!(store.list().unwrap().len(), 1);
}

// ============================================================================
// SECTION: Lifecycle and Safety
// ============================================================================

#[test]
fn closed_store_reports_fault() {
    let (_dir, store) = fresh_store(false);
    store.close().unwrap();
    let err = store.list().unwrap_err();
    assert!(err.is_fault());
    assert!(store.close().is_err());
}

#[test]
fn directory_path_is_rejected() {
    let dir = TempDir::new().unwrap();
    let err = SqliteClientStore::new(SqliteStoreConfig::at_path(dir.path())).err().unwrap();
    assert!(matches!(err, SqliteStoreError::Invalid(_)));
}

#[test]
fn overlong_component_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("a".repeat(300));
    let err = SqliteClientStore::new(SqliteStoreConfig::at_path(path)).err().unwrap();
    assert!(matches!(err, SqliteStoreError::Invalid(_)));
}

#[test]
fn unknown_schema_version_fails_closed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("clients.db");
    drop(store_at(&path, false));
    {
        let connection = Connection::open(&path).unwrap();
        connection.execute("UPDATE store_meta SET version = 99", []).unwrap();
    }
    let err = SqliteClientStore::new(SqliteStoreConfig::at_path(&path)).err().unwrap();
    assert!(matches!(err, SqliteStoreError::VersionMismatch(_)));
}

#[test]
fn delete_journal_mode_is_supported() {
    let dir = TempDir::new().unwrap();
    let mut config = SqliteStoreConfig::at_path(dir.path().join("nested").join("clients.db"));
    config.journal_mode = SqliteStoreMode::Delete;
    let store = SqliteClientStore::new(config).unwrap();
    assert_eq!(store.initialize().unwrap().seeded, 3);
}
