// crates/client-records-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Client Store
// Description: Durable ClientStore backed by SQLite WAL.
// Purpose: Persist client records with a uniqueness constraint on clientId.
// Dependencies: client-records-core, rusqlite, serde, thiserror, tracing
// ============================================================================

//! ## Overview
//! This module implements a durable [`ClientStore`] using `SQLite`. All client
//! rows live in a single `clients` table. Every mutation is one statement with
//! a `RETURNING` clause, so the affected row is read back atomically and no
//! partial write can be observed. `clientId` uniqueness is enforced by a
//! `UNIQUE` constraint and surfaced as [`StoreError::DuplicateKey`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use client_records_core::ClientFields;
use client_records_core::ClientId;
use client_records_core::ClientKey;
use client_records_core::ClientRecord;
use client_records_core::ClientStore;
use client_records_core::InitReport;
use client_records_core::RecordId;
use client_records_core::StoreError;
use client_records_core::StoreStats;
use client_records_core::Timestamp;
use client_records_core::default_clients;
use rusqlite::Connection;
use rusqlite::ErrorCode;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::ToSql;
use rusqlite::params;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Column list shared by every row-returning statement.
const CLIENT_COLUMNS: &str = "id, clientId, name, email, phone, created_at, updated_at";

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` client store.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
    /// Seed example clients into an empty table on initialize.
    #[serde(default = "default_seed_defaults")]
    pub seed_defaults: bool,
}

impl SqliteStoreConfig {
    /// Builds a config with defaults for everything but the path.
    #[must_use]
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
            seed_defaults: true,
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Seeding is on unless disabled.
const fn default_seed_defaults() -> bool {
    true
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Stored row could not be decoded.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store configuration or data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// `clientId` uniqueness violation.
    #[error("sqlite store duplicate client id: {0}")]
    Duplicate(ClientId),
    /// No row matched.
    #[error("sqlite store row not found")]
    NotFound,
    /// The connection has been closed.
    #[error("sqlite store is closed")]
    Closed,
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
            SqliteStoreError::Duplicate(client_id) => Self::DuplicateKey {
                client_id,
            },
            SqliteStoreError::NotFound => Self::NotFound,
            SqliteStoreError::Closed => Self::Store("store is closed".to_string()),
        }
    }
}

/// Maps an engine error from a write touching `client_id`.
fn write_error(err: rusqlite::Error, client_id: &ClientId) -> SqliteStoreError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
                && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            SqliteStoreError::Duplicate(client_id.clone())
        }
        rusqlite::Error::QueryReturnedNoRows => SqliteStoreError::NotFound,
        _ => SqliteStoreError::Db(err.to_string()),
    }
}

/// Maps an engine error from a read.
fn read_error(err: rusqlite::Error) -> SqliteStoreError {
    match err {
        rusqlite::Error::QueryReturnedNoRows => SqliteStoreError::NotFound,
        rusqlite::Error::FromSqlConversionFailure(..) | rusqlite::Error::InvalidColumnType(..) => {
            SqliteStoreError::Corrupt(err.to_string())
        }
        other => SqliteStoreError::Db(other.to_string()),
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed client store with WAL support.
pub struct SqliteClientStore {
    /// Store configuration.
    config: SqliteStoreConfig,
    /// Shared `SQLite` connection guarded by a mutex; `None` once closed.
    connection: Mutex<Option<Connection>>,
}

impl SqliteClientStore {
    /// Opens an `SQLite`-backed client store and ensures its schema exists.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn new(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(&config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            config,
            connection: Mutex::new(Some(connection)),
        })
    }

    /// Returns the database file location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Runs `f` against the open connection.
    fn with_connection<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> Result<T, SqliteStoreError>,
    ) -> Result<T, SqliteStoreError> {
        let mut guard = self
            .connection
            .lock()
            .map_err(|_| SqliteStoreError::Db("mutex poisoned".to_string()))?;
        let connection = guard.as_mut().ok_or(SqliteStoreError::Closed)?;
        f(connection)
    }

    /// Seeds default clients when the table is empty.
    fn seed_if_empty(&self) -> Result<usize, SqliteStoreError> {
        if !self.config.seed_defaults {
            return Ok(0);
        }
        self.with_connection(|connection| {
            let tx = connection.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            let count: i64 = tx
                .query_row("SELECT COUNT(*) FROM clients", params![], |row| row.get(0))
                .map_err(read_error)?;
            if count > 0 {
                return Ok(0);
            }
            let seeds = default_clients();
            let now = Timestamp::now().unix_millis();
            for fields in &seeds {
                tx.execute(
                    "INSERT INTO clients (clientId, name, email, phone, created_at, updated_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                    params![
                        fields.client_id.as_str(),
                        fields.name,
                        fields.email,
                        fields.phone,
                        now
                    ],
                )
                .map_err(|err| write_error(err, &fields.client_id))?;
            }
            tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            Ok(seeds.len())
        })
    }

    /// Inserts a record.
    fn insert_record(&self, fields: &ClientFields) -> Result<ClientRecord, SqliteStoreError> {
        let now = Timestamp::now().unix_millis();
        self.with_connection(|connection| {
            connection
                .query_row(
                    &format!(
                        "INSERT INTO clients (clientId, name, email, phone, created_at, \
                         updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?5) RETURNING {CLIENT_COLUMNS}"
                    ),
                    params![fields.client_id.as_str(), fields.name, fields.email, fields.phone, now],
                    client_from_row,
                )
                .map_err(|err| write_error(err, &fields.client_id))
        })
    }

    /// Loads a record by selector.
    fn get_record(&self, key: &ClientKey) -> Result<ClientRecord, SqliteStoreError> {
        let (column, value) = key_filter(key);
        self.with_connection(|connection| {
            connection
                .query_row(
                    &format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE {column} = ?1"),
                    [&*value],
                    client_from_row,
                )
                .optional()
                .map_err(read_error)?
                .ok_or(SqliteStoreError::NotFound)
        })
    }

    /// Lists every record ordered by name.
    fn list_records(&self) -> Result<Vec<ClientRecord>, SqliteStoreError> {
        self.with_connection(|connection| {
            let mut statement = connection
                .prepare(&format!("SELECT {CLIENT_COLUMNS} FROM clients ORDER BY name, id"))
                .map_err(read_error)?;
            let rows = statement.query_map(params![], client_from_row).map_err(read_error)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(read_error)
        })
    }

    /// Replaces every mutable field of a record.
    fn update_record(
        &self,
        key: &ClientKey,
        fields: &ClientFields,
    ) -> Result<ClientRecord, SqliteStoreError> {
        let (column, value) = key_filter(key);
        let now = Timestamp::now().unix_millis();
        self.with_connection(|connection| {
            connection
                .query_row(
                    &format!(
                        "UPDATE clients SET clientId = ?1, name = ?2, email = ?3, phone = ?4, \
                         updated_at = MAX(?5, updated_at + 1) WHERE {column} = ?6 RETURNING \
                         {CLIENT_COLUMNS}"
                    ),
                    params![
                        fields.client_id.as_str(),
                        fields.name,
                        fields.email,
                        fields.phone,
                        now,
                        &*value
                    ],
                    client_from_row,
                )
                .map_err(|err| write_error(err, &fields.client_id))
        })
    }

    /// Deletes a record and returns the pre-deletion row.
    fn delete_record(&self, key: &ClientKey) -> Result<ClientRecord, SqliteStoreError> {
        let (column, value) = key_filter(key);
        self.with_connection(|connection| {
            connection
                .query_row(
                    &format!("DELETE FROM clients WHERE {column} = ?1 RETURNING {CLIENT_COLUMNS}"),
                    [&*value],
                    client_from_row,
                )
                .map_err(read_error)
        })
    }

    /// Reads the row count and latest insertion time.
    fn read_stats(&self) -> Result<StoreStats, SqliteStoreError> {
        self.with_connection(|connection| {
            let (count, latest): (i64, Option<i64>) = connection
                .query_row("SELECT COUNT(*), MAX(created_at) FROM clients", params![], |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })
                .map_err(read_error)?;
            let total_clients = u64::try_from(count)
                .map_err(|_| SqliteStoreError::Corrupt("negative row count".to_string()))?;
            Ok(StoreStats {
                total_clients,
                latest_created_at: latest.map(Timestamp::from_unix_millis),
            })
        })
    }

    /// Closes the connection; later calls fail with [`SqliteStoreError::Closed`].
    fn close_connection(&self) -> Result<(), SqliteStoreError> {
        let connection = self
            .connection
            .lock()
            .map_err(|_| SqliteStoreError::Db("mutex poisoned".to_string()))?
            .take()
            .ok_or(SqliteStoreError::Closed)?;
        connection.close().map_err(|(_, err)| SqliteStoreError::Db(err.to_string()))?;
        info!(path = %self.config.path.display(), "client store closed");
        Ok(())
    }
}

impl ClientStore for SqliteClientStore {
    fn initialize(&self) -> Result<InitReport, StoreError> {
        self.with_connection(initialize_schema)?;
        let seeded = self.seed_if_empty()?;
        if seeded > 0 {
            info!(seeded, "seeded default clients into empty store");
        }
        Ok(InitReport {
            seeded,
        })
    }

    fn insert(&self, fields: &ClientFields) -> Result<ClientRecord, StoreError> {
        self.insert_record(fields).map_err(StoreError::from)
    }

    fn get(&self, key: &ClientKey) -> Result<ClientRecord, StoreError> {
        self.get_record(key).map_err(StoreError::from)
    }

    fn list(&self) -> Result<Vec<ClientRecord>, StoreError> {
        self.list_records().map_err(StoreError::from)
    }

    fn update(&self, key: &ClientKey, fields: &ClientFields) -> Result<ClientRecord, StoreError> {
        self.update_record(key, fields).map_err(StoreError::from)
    }

    fn delete(&self, key: &ClientKey) -> Result<ClientRecord, StoreError> {
        self.delete_record(key).map_err(StoreError::from)
    }

    fn stats(&self) -> Result<StoreStats, StoreError> {
        self.read_stats().map_err(StoreError::from)
    }

    fn close(&self) -> Result<(), StoreError> {
        self.close_connection().map_err(StoreError::from)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the filter column and bound value for a selector.
fn key_filter(key: &ClientKey) -> (&'static str, Box<dyn ToSql + '_>) {
    match key {
        ClientKey::Id(id) => ("id", Box::new(id.get())),
        ClientKey::ClientId(client_id) => ("clientId", Box::new(client_id.as_str())),
    }
}

/// Decodes a `clients` row selected with [`CLIENT_COLUMNS`].
fn client_from_row(row: &Row<'_>) -> rusqlite::Result<ClientRecord> {
    let created_at: i64 = row.get(5)?;
    let updated_at: i64 = row.get(6)?;
    Ok(ClientRecord {
        id: RecordId::new(row.get(0)?),
        client_id: ClientId::new(row.get::<_, String>(1)?),
        name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        created_at: Timestamp::from_unix_millis(created_at),
        updated_at: Timestamp::from_unix_millis(updated_at),
    })
}

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    let path_string = path.display().to_string();
    if path_string.trim().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must be non-empty".to_string()));
    }
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.exists() && path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with secure defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Creates the schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS clients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            clientId TEXT UNIQUE NOT NULL,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            phone TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_clients_name ON clients (name);",
    )
    .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}
