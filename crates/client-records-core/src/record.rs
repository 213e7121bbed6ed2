// crates/client-records-core/src/record.rs
// ============================================================================
// Module: Client Record Model
// Description: Identifiers, timestamps, and the persisted client record.
// Purpose: Provide the single entity owned by the client store.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! A [`ClientRecord`] is the only persisted entity. It carries a store-assigned
//! surrogate [`RecordId`] and a caller-chosen business [`ClientId`]. The wire
//! field names (`clientId`, `created_at`, `updated_at`) match the rows the
//! Form Client already consumes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de::Error as _;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Identifiers
// ============================================================================

/// Store-assigned surrogate key.
///
/// # Invariants
/// - Assigned once by the store and never changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(i64);

impl RecordId {
    /// Wraps a raw surrogate key.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw surrogate key.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Parses a path segment as a surrogate key.
    ///
    /// Returns `None` for anything that is not a plain base-10 integer.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        text.trim().parse::<i64>().ok().map(Self)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Caller-chosen business identifier (for example `TB-001`).
///
/// # Invariants
/// - Unique across all persisted records.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    /// Creates a new business identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Timestamps
// ============================================================================

/// Wall-clock timestamp in unix milliseconds, rendered as RFC 3339 on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Wraps a unix millisecond value.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
        Self(i64::try_from(now.as_millis()).unwrap_or(i64::MAX))
    }

    /// Returns the unix millisecond value.
    #[must_use]
    pub const fn unix_millis(self) -> i64 {
        self.0
    }

    /// Returns the timestamp one millisecond later.
    #[must_use]
    pub const fn next_millisecond(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Formats the timestamp as RFC 3339 in UTC.
    ///
    /// Values outside the representable calendar range fall back to the raw
    /// millisecond count.
    #[must_use]
    pub fn to_rfc3339(self) -> String {
        OffsetDateTime::from_unix_timestamp_nanos(i128::from(self.0) * 1_000_000)
            .ok()
            .and_then(|value| value.format(&Rfc3339).ok())
            .unwrap_or_else(|| self.0.to_string())
    }

    /// Parses an RFC 3339 timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`time::error::Parse`] when the input is not RFC 3339.
    pub fn parse_rfc3339(text: &str) -> Result<Self, time::error::Parse> {
        let parsed = OffsetDateTime::parse(text, &Rfc3339)?;
        let millis = parsed.unix_timestamp_nanos() / 1_000_000;
        Ok(Self(i64::try_from(millis).unwrap_or(i64::MAX)))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_rfc3339())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse_rfc3339(&text).map_err(D::Error::custom)
    }
}

// ============================================================================
// SECTION: Records
// ============================================================================

/// Persisted client contact record.
///
/// # Invariants
/// - `name` and `email` are never empty.
/// - `updated_at >= created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRecord {
    /// Store-assigned surrogate key.
    pub id: RecordId,
    /// Business identifier.
    #[serde(rename = "clientId")]
    pub client_id: ClientId,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Optional phone number, free-form.
    pub phone: Option<String>,
    /// Insertion time.
    pub created_at: Timestamp,
    /// Time of the last successful mutation.
    pub updated_at: Timestamp,
}

/// Full, validated field set written on insert and update.
///
/// Updates replace every field; there is no partial patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientFields {
    /// Business identifier.
    pub client_id: ClientId,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Optional phone number.
    pub phone: Option<String>,
}

/// Selector for the two ways a record can be addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientKey {
    /// Address by surrogate key.
    Id(RecordId),
    /// Address by business identifier.
    ClientId(ClientId),
}

impl fmt::Display for ClientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id {id}"),
            Self::ClientId(client_id) => write!(f, "clientId {client_id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use super::*;

    #[test]
    fn record_id_parse_rejects_non_numeric() {
        assert_eq!(RecordId::parse("42"), Some(RecordId::new(42)));
        assert_eq!(RecordId::parse("-3"), Some(RecordId::new(-3)));
        assert_eq!(RecordId::parse("abc"), None);
        assert_eq!(RecordId::parse("12abc"), None);
        assert_eq!(RecordId::parse(""), None);
    }

    #[test]
    fn timestamp_renders_rfc3339_with_millis() {
        let stamp = Timestamp::from_unix_millis(1_700_000_000_123);
        let text = stamp.to_rfc3339();
        assert_eq!(text, "2023-11-14T22:13:20.123Z");
        assert_eq!(Timestamp::parse_rfc3339(&text).unwrap(), stamp);
    }

    #[test]
    fn record_serializes_with_wire_field_names() {
        let record = ClientRecord {
            id: RecordId::new(7),
            client_id: ClientId::new("TB-007"),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
            created_at: Timestamp::from_unix_millis(0),
            updated_at: Timestamp::from_unix_millis(0),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["clientId"], "TB-007");
        assert!(value["phone"].is_null());
        assert_eq!(value["created_at"], "1970-01-01T00:00:00Z");
    }
}
