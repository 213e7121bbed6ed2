// crates/client-records-store-sqlite/src/lib.rs
// ============================================================================
// Module: Client Records SQLite Store
// Description: Durable SQLite-backed client store.
// Purpose: Provide the production persistence backend for client records.
// Dependencies: client-records-core, rusqlite
// ============================================================================

//! ## Overview
//! Durable [`client_records_core::ClientStore`] implementation backed by
//! `SQLite`. The store opens in WAL mode by default, validates its schema
//! version on open, and fails closed on mismatch.

pub mod store;

pub use store::SqliteClientStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
