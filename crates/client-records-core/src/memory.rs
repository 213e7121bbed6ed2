// crates/client-records-core/src/memory.rs
// ============================================================================
// Module: In-Memory Client Store
// Description: Simple in-memory client store for tests and examples.
// Purpose: Provide a deterministic store implementation without external deps.
// Dependencies: crate::record, crate::store
// ============================================================================

//! ## Overview
//! This module provides a simple in-memory implementation of [`ClientStore`]
//! for tests and local demos. It mirrors the durable store's semantics
//! (uniqueness, ordering, strictly increasing `updated_at`) but nothing
//! survives the process.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::record::ClientFields;
use crate::record::ClientKey;
use crate::record::ClientRecord;
use crate::record::RecordId;
use crate::record::Timestamp;
use crate::seed::default_clients;
use crate::store::ClientStore;
use crate::store::InitReport;
use crate::store::StoreError;
use crate::store::StoreStats;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// Mutable state behind the in-memory store mutex.
#[derive(Debug, Default)]
struct MemoryState {
    /// Last assigned surrogate key.
    last_id: i64,
    /// Records by surrogate key.
    rows: BTreeMap<RecordId, ClientRecord>,
    /// Set once [`ClientStore::close`] has run.
    closed: bool,
}

/// In-memory client store for tests and examples.
#[derive(Debug, Clone)]
pub struct InMemoryClientStore {
    /// Store state protected by a mutex.
    state: Arc<Mutex<MemoryState>>,
    /// Whether `initialize` seeds the default clients.
    seed_defaults: bool,
}

impl Default for InMemoryClientStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryClientStore {
    /// Creates an empty store that seeds defaults on `initialize`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seeding(true)
    }

    /// Creates an empty store with explicit seeding behavior.
    #[must_use]
    pub fn with_seeding(seed_defaults: bool) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            seed_defaults,
        }
    }

    /// Locks the state, failing once the store is closed.
    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        let guard = self
            .state
            .lock()
            .map_err(|_| StoreError::Store("client store mutex poisoned".to_string()))?;
        if guard.closed {
            return Err(StoreError::Store("client store is closed".to_string()));
        }
        Ok(guard)
    }
}

impl MemoryState {
    /// Resolves a selector to a surrogate key.
    fn resolve(&self, key: &ClientKey) -> Option<RecordId> {
        match key {
            ClientKey::Id(id) => self.rows.contains_key(id).then_some(*id),
            ClientKey::ClientId(client_id) => self
                .rows
                .values()
                .find(|record| &record.client_id == client_id)
                .map(|record| record.id),
        }
    }

    /// Returns true when another record already owns the business identifier.
    fn client_id_taken(&self, fields: &ClientFields, except: Option<RecordId>) -> bool {
        self.rows
            .values()
            .any(|record| record.client_id == fields.client_id && Some(record.id) != except)
    }

    /// Inserts a validated field set.
    fn insert(&mut self, fields: &ClientFields) -> Result<ClientRecord, StoreError> {
        if self.client_id_taken(fields, None) {
            return Err(StoreError::DuplicateKey {
                client_id: fields.client_id.clone(),
            });
        }
        self.last_id += 1;
        let now = Timestamp::now();
        let record = ClientRecord {
            id: RecordId::new(self.last_id),
            client_id: fields.client_id.clone(),
            name: fields.name.clone(),
            email: fields.email.clone(),
            phone: fields.phone.clone(),
            created_at: now,
            updated_at: now,
        };
        self.rows.insert(record.id, record.clone());
        Ok(record)
    }
}

impl ClientStore for InMemoryClientStore {
    fn initialize(&self) -> Result<InitReport, StoreError> {
        let mut guard = self.lock()?;
        if !self.seed_defaults || !guard.rows.is_empty() {
            return Ok(InitReport {
                seeded: 0,
            });
        }
        let seeds = default_clients();
        for fields in &seeds {
            guard.insert(fields)?;
        }
        drop(guard);
        Ok(InitReport {
            seeded: seeds.len(),
        })
    }

    fn insert(&self, fields: &ClientFields) -> Result<ClientRecord, StoreError> {
        self.lock()?.insert(fields)
    }

    fn get(&self, key: &ClientKey) -> Result<ClientRecord, StoreError> {
        let guard = self.lock()?;
        let id = guard.resolve(key).ok_or(StoreError::NotFound)?;
        guard.rows.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    fn list(&self) -> Result<Vec<ClientRecord>, StoreError> {
        let mut records: Vec<ClientRecord> = self.lock()?.rows.values().cloned().collect();
        records.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(records)
    }

    fn update(&self, key: &ClientKey, fields: &ClientFields) -> Result<ClientRecord, StoreError> {
        let mut guard = self.lock()?;
        let id = guard.resolve(key).ok_or(StoreError::NotFound)?;
        if guard.client_id_taken(fields, Some(id)) {
            return Err(StoreError::DuplicateKey {
                client_id: fields.client_id.clone(),
            });
        }
        let record = guard.rows.get_mut(&id).ok_or(StoreError::NotFound)?;
        record.client_id = fields.client_id.clone();
        record.name = fields.name.clone();
        record.email = fields.email.clone();
        record.phone = fields.phone.clone();
        record.updated_at = Timestamp::now().max(record.updated_at.next_millisecond());
        Ok(record.clone())
    }

    fn delete(&self, key: &ClientKey) -> Result<ClientRecord, StoreError> {
        let mut guard = self.lock()?;
        let id = guard.resolve(key).ok_or(StoreError::NotFound)?;
        guard.rows.remove(&id).ok_or(StoreError::NotFound)
    }

    fn stats(&self) -> Result<StoreStats, StoreError> {
        let guard = self.lock()?;
        Ok(StoreStats {
            total_clients: u64::try_from(guard.rows.len()).unwrap_or(u64::MAX),
            latest_created_at: guard.rows.values().map(|record| record.created_at).max(),
        })
    }

    fn close(&self) -> Result<(), StoreError> {
        self.lock()?.closed = true;
        Ok(())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use super::*;
    use crate::record::ClientId;

    fn fields(client_id: &str, name: &str) -> ClientFields {
        ClientFields {
            client_id: ClientId::new(client_id),
            name: name.to_string(),
            email: "someone@example.com".to_string(),
            phone: None,
        }
    }

    #[test]
    fn initialize_seeds_only_once() {
        let store = InMemoryClientStore::new();
        assert_eq!(store.initialize().unwrap().seeded, 3);
        assert_eq!(store.initialize().unwrap().seeded, 0);
        let ids: Vec<String> =
            store.list().unwrap().into_iter().map(|r| r.client_id.to_string()).collect();
        assert_eq!(ids, vec!["TB-001", "TB-003", "TB-002"]);
    }

    #[test]
    fn update_rejects_collision_without_changes() {
        let store = InMemoryClientStore::with_seeding(false);
        let first = store.insert(&fields("A-1", "Alpha")).unwrap();
        store.insert(&fields("B-1", "Beta")).unwrap();
        let err = store.update_by_id(first.id, &fields("B-1", "Renamed")).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { .. }));
        assert_eq!(store.get_by_id(first.id).unwrap().name, "Alpha");
    }

    #[test]
    fn update_keeps_own_client_id_and_advances_updated_at() {
        let store = InMemoryClientStore::with_seeding(false);
        let created = store.insert(&fields("A-1", "Alpha")).unwrap();
        let updated = store.update_by_client_id(&ClientId::new("A-1"), &fields("A-1", "Al")).unwrap();
        assert_eq!(updated.name, "Al");
        assert!(updated.updated_at > updated.created_at);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[test]
    fn closed_store_rejects_calls() {
        let store = InMemoryClientStore::with_seeding(false);
        store.close().unwrap();
        assert!(store.list().unwrap_err().is_fault());
    }
}
