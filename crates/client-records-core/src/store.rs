// crates/client-records-core/src/store.rs
// ============================================================================
// Module: Client Store Interface
// Description: Storage seam for client records.
// Purpose: Define the backend-agnostic contract every client store satisfies.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! [`ClientStore`] is the only persistence seam. Implementations rely on the
//! backend's statement-level atomicity: each mutation either fully applies or
//! leaves no trace. Uniqueness of [`ClientId`] is enforced by the backend and
//! reported as [`StoreError::DuplicateKey`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use thiserror::Error;

use crate::record::ClientFields;
use crate::record::ClientId;
use crate::record::ClientKey;
use crate::record::ClientRecord;
use crate::record::RecordId;
use crate::record::Timestamp;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Client store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Write would violate `clientId` uniqueness.
    #[error("client id already exists: {client_id}")]
    DuplicateKey {
        /// Offending business identifier.
        client_id: ClientId,
    },
    /// No record matches the selector.
    #[error("client not found")]
    NotFound,
    /// Store I/O error.
    #[error("client store io error: {0}")]
    Io(String),
    /// Store data is corrupted.
    #[error("client store corruption: {0}")]
    Corrupt(String),
    /// Store schema version is incompatible.
    #[error("client store version mismatch: {0}")]
    VersionMismatch(String),
    /// Store data is invalid.
    #[error("client store invalid data: {0}")]
    Invalid(String),
    /// Store reported an error.
    #[error("client store error: {0}")]
    Store(String),
}

impl StoreError {
    /// Returns true for faults of the storage layer itself, as opposed to
    /// outcomes the caller can act on (duplicate, missing).
    #[must_use]
    pub const fn is_fault(&self) -> bool {
        !matches!(self, Self::DuplicateKey { .. } | Self::NotFound)
    }
}

// ============================================================================
// SECTION: Stats
// ============================================================================

/// Row summary reported by `/stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    /// Total persisted records.
    pub total_clients: u64,
    /// Most recent insertion time, if any record exists.
    pub latest_created_at: Option<Timestamp>,
}

/// Outcome of [`ClientStore::initialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitReport {
    /// Number of seed records inserted (zero when the table was not empty).
    pub seeded: usize,
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Durable storage for client records.
pub trait ClientStore {
    /// Ensures the schema exists and seeds default records into an empty store.
    ///
    /// Safe to call on every process start.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when initialization fails.
    fn initialize(&self) -> Result<InitReport, StoreError>;

    /// Inserts a new record and returns it with its assigned id and timestamps.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateKey`] when `clientId` already exists.
    fn insert(&self, fields: &ClientFields) -> Result<ClientRecord, StoreError>;

    /// Loads a single record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no record matches.
    fn get(&self, key: &ClientKey) -> Result<ClientRecord, StoreError>;

    /// Lists every record ordered by name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the listing fails.
    fn list(&self) -> Result<Vec<ClientRecord>, StoreError>;

    /// Replaces all mutable fields of a record and refreshes `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no record matches, or
    /// [`StoreError::DuplicateKey`] when the new `clientId` belongs to another
    /// record.
    fn update(&self, key: &ClientKey, fields: &ClientFields) -> Result<ClientRecord, StoreError>;

    /// Deletes a record and returns its pre-deletion snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no record matches.
    fn delete(&self, key: &ClientKey) -> Result<ClientRecord, StoreError>;

    /// Returns the row count and latest insertion time.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn stats(&self) -> Result<StoreStats, StoreError>;

    /// Flushes and releases the underlying handle. Later calls fail.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the handle cannot be closed cleanly.
    fn close(&self) -> Result<(), StoreError>;

    /// Loads a record by surrogate key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no record matches.
    fn get_by_id(&self, id: RecordId) -> Result<ClientRecord, StoreError> {
        self.get(&ClientKey::Id(id))
    }

    /// Loads a record by business identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no record matches.
    fn get_by_client_id(&self, client_id: &ClientId) -> Result<ClientRecord, StoreError> {
        self.get(&ClientKey::ClientId(client_id.clone()))
    }

    /// Updates a record addressed by surrogate key.
    ///
    /// # Errors
    ///
    /// See [`ClientStore::update`].
    fn update_by_id(&self, id: RecordId, fields: &ClientFields) -> Result<ClientRecord, StoreError> {
        self.update(&ClientKey::Id(id), fields)
    }

    /// Updates a record addressed by business identifier.
    ///
    /// # Errors
    ///
    /// See [`ClientStore::update`].
    fn update_by_client_id(
        &self,
        client_id: &ClientId,
        fields: &ClientFields,
    ) -> Result<ClientRecord, StoreError> {
        self.update(&ClientKey::ClientId(client_id.clone()), fields)
    }

    /// Deletes a record addressed by surrogate key.
    ///
    /// # Errors
    ///
    /// See [`ClientStore::delete`].
    fn delete_by_id(&self, id: RecordId) -> Result<ClientRecord, StoreError> {
        self.delete(&ClientKey::Id(id))
    }

    /// Deletes a record addressed by business identifier.
    ///
    /// # Errors
    ///
    /// See [`ClientStore::delete`].
    fn delete_by_client_id(&self, client_id: &ClientId) -> Result<ClientRecord, StoreError> {
        self.delete(&ClientKey::ClientId(client_id.clone()))
    }
}

// ============================================================================
// SECTION: Shared Store Wrapper
// ============================================================================

/// Shared client store backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedClientStore {
    /// Inner store implementation.
    inner: Arc<dyn ClientStore + Send + Sync>,
}

impl SharedClientStore {
    /// Wraps a client store in a shared, clonable wrapper.
    #[must_use]
    pub fn from_store(store: impl ClientStore + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wraps an existing shared store.
    #[must_use]
    pub const fn new(store: Arc<dyn ClientStore + Send + Sync>) -> Self {
        Self {
            inner: store,
        }
    }
}

impl ClientStore for SharedClientStore {
    fn initialize(&self) -> Result<InitReport, StoreError> {
        self.inner.initialize()
    }

    fn insert(&self, fields: &ClientFields) -> Result<ClientRecord, StoreError> {
        self.inner.insert(fields)
    }

    fn get(&self, key: &ClientKey) -> Result<ClientRecord, StoreError> {
        self.inner.get(key)
    }

    fn list(&self) -> Result<Vec<ClientRecord>, StoreError> {
        self.inner.list()
    }

    fn update(&self, key: &ClientKey, fields: &ClientFields) -> Result<ClientRecord, StoreError> {
        self.inner.update(key, fields)
    }

    fn delete(&self, key: &ClientKey) -> Result<ClientRecord, StoreError> {
        self.inner.delete(key)
    }

    fn stats(&self) -> Result<StoreStats, StoreError> {
        self.inner.stats()
    }

    fn close(&self) -> Result<(), StoreError> {
        self.inner.close()
    }
}
