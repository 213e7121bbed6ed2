// crates/client-records-core/src/directory.rs
// ============================================================================
// Module: Client Directory
// Description: Form-friendly directory keyed by a name-derived lookup key.
// Purpose: Build the immutable snapshot the Form Client selects clients from.
// Dependencies: indexmap, serde
// ============================================================================

//! ## Overview
//! The directory maps a lookup key derived from each client's name to a
//! trimmed-down entry. Keys are not deduplicated: when two names derive the
//! same key, the record that comes later in the input order replaces the
//! earlier one in place. Entries keep listing order, which is the order the
//! form presents them in. A [`DirectorySnapshot`] is immutable; refreshing means pulling
//! a new snapshot.

// ============================================================================
// SECTION: Imports
// ============================================================================

use indexmap::IndexMap;
use serde::Deserialize;
use serde::Serialize;

use crate::record::ClientRecord;
use crate::record::RecordId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum number of characters kept in a derived directory key.
pub const DIRECTORY_KEY_MAX_CHARS: usize = 10;

// ============================================================================
// SECTION: Keys
// ============================================================================

/// Derives the directory key for a client name.
///
/// The name is lower-cased, everything outside `[a-z0-9]` is dropped, and the
/// result is truncated to [`DIRECTORY_KEY_MAX_CHARS`].
#[must_use]
pub fn directory_key(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit())
        .take(DIRECTORY_KEY_MAX_CHARS)
        .collect()
}

// ============================================================================
// SECTION: Snapshot
// ============================================================================

/// Directory entry exposed to the Form Client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// Store-assigned surrogate key.
    pub id: RecordId,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Phone number, empty when unknown.
    #[serde(default)]
    pub phone: String,
    /// Business identifier.
    #[serde(rename = "clientId")]
    pub client_id: String,
}

impl From<&ClientRecord> for DirectoryEntry {
    fn from(record: &ClientRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            email: record.email.clone(),
            phone: record.phone.clone().unwrap_or_default(),
            client_id: record.client_id.as_str().to_string(),
        }
    }
}

/// Immutable directory keyed by derived lookup key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirectorySnapshot {
    /// Entries by derived key, in first-seen order.
    entries: IndexMap<String, DirectoryEntry>,
}

impl DirectorySnapshot {
    /// Builds a snapshot from records in listing order; later keys win.
    #[must_use]
    pub fn from_records(records: &[ClientRecord]) -> Self {
        let mut entries = IndexMap::new();
        for record in records {
            entries.insert(directory_key(&record.name), DirectoryEntry::from(record));
        }
        Self {
            entries,
        }
    }

    /// Returns the entry for a derived key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&DirectoryEntry> {
        self.entries.get(key)
    }

    /// Finds an entry by business identifier.
    #[must_use]
    pub fn find_by_client_id(&self, client_id: &str) -> Option<&DirectoryEntry> {
        self.entries.values().find(|entry| entry.client_id == client_id)
    }

    /// Iterates entries in listing order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DirectoryEntry)> {
        self.entries.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    /// Returns the number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the snapshot has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use proptest::prelude::*;

    use super::*;
    use crate::record::ClientId;
    use crate::record::Timestamp;

    fn record(id: i64, client_id: &str, name: &str) -> ClientRecord {
        ClientRecord {
            id: RecordId::new(id),
            client_id: ClientId::new(client_id),
            name: name.to_string(),
            email: format!("{client_id}@example.com"),
            phone: None,
            created_at: Timestamp::from_unix_millis(1),
            updated_at: Timestamp::from_unix_millis(1),
        }
    }

    #[test]
    fn key_drops_punctuation_and_truncates() {
        assert_eq!(directory_key("John Smith"), "johnsmith");
        assert_eq!(directory_key("Sarah Johnson"), "sarahjohns");
        assert_eq!(directory_key("O'Neil-2"), "oneil2");
        assert_eq!(directory_key("Émile"), "mile");
        assert_eq!(directory_key("!!!"), "");
    }

    #[test]
    fn colliding_keys_keep_the_later_record() {
        let records = vec![record(1, "TB-1", "Sam Lee"), record(2, "TB-2", "Sam-Lee")];
        let snapshot = DirectorySnapshot::from_records(&records);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get("samlee").unwrap().client_id, "TB-2");
        assert!(snapshot.find_by_client_id("TB-1").is_none());
    }

    #[test]
    fn missing_phone_renders_empty() {
        let snapshot = DirectorySnapshot::from_records(&[record(3, "TB-3", "Mike Wilson")]);
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["mikewilson"]["phone"], "");
        assert_eq!(value["mikewilson"]["clientId"], "TB-3");
    }

    #[test]
    fn entries_keep_listing_order() {
        let records = vec![
            record(2, "TB-2", "Bob Stone"),
            record(1, "TB-1", "alice Green"),
            record(3, "TB-3", "Bob-Stone"),
        ];
        let snapshot = DirectorySnapshot::from_records(&records);
        let keys: Vec<&str> = snapshot.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["bobstone", "alicegreen"]);
        assert_eq!(snapshot.get("bobstone").unwrap().client_id, "TB-3");
        let rendered = serde_json::to_string(&snapshot).unwrap();
        assert!(rendered.find("bobstone").unwrap() < rendered.find("alicegreen").unwrap());
        let parsed: DirectorySnapshot = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed, snapshot);
    }

    proptest! {
        #[test]
        fn key_is_bounded_lowercase_alphanumeric(name in ".{0,40}") {
            let key = directory_key(&name);
            prop_assert!(key.chars().count() <= DIRECTORY_KEY_MAX_CHARS);
            prop_assert!(key.chars().all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit()));
        }
    }
}
