// crates/client-records-core/src/validation.rs
// ============================================================================
// Module: Client Input Validation
// Description: Request payload parsing and field rules for client writes.
// Purpose: Reject malformed input before any storage call is made.
// Dependencies: regex, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`ClientInput`] is the untrusted request body for create and update calls.
//! It is converted into [`ClientFields`] only after the required fields are
//! present and the email matches the basic `local@domain.tld` shape.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::record::ClientFields;
use crate::record::ClientId;

// ============================================================================
// SECTION: Email Shape
// ============================================================================

/// Basic `local@domain.tld` shape: no whitespace, a single `@`, a dotted domain.
static EMAIL_SHAPE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

/// Returns true when `email` matches the `local@domain.tld` shape.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_SHAPE.as_ref().is_some_and(|pattern| pattern.is_match(email))
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Input rejected before reaching the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Body is not a JSON object with string fields.
    #[error("Invalid JSON body: {0}")]
    MalformedBody(String),
    /// One or more required fields are missing or empty.
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    /// Email does not match the basic shape.
    #[error("Invalid email format")]
    InvalidEmail,
    /// Path identifier is not an integer.
    #[error("Invalid ID format")]
    InvalidId,
    /// Business identifier path segment could not be decoded.
    #[error("Invalid client ID format")]
    InvalidClientId,
}

// ============================================================================
// SECTION: Input
// ============================================================================

/// Untrusted create/update payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ClientInput {
    /// Business identifier.
    #[serde(rename = "clientId", default)]
    pub client_id: Option<String>,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Contact email.
    #[serde(default)]
    pub email: Option<String>,
    /// Optional phone number.
    #[serde(default)]
    pub phone: Option<String>,
}

impl ClientInput {
    /// Parses a JSON request body.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MalformedBody`] when the body is not a JSON
    /// object with string (or null) fields.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ValidationError> {
        serde_json::from_slice(bytes).map_err(|err| ValidationError::MalformedBody(err.to_string()))
    }

    /// Validates a create payload. `clientId`, `name` and `email` are required.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when a field is missing or malformed.
    pub fn into_create_fields(self) -> Result<ClientFields, ValidationError> {
        self.into_fields(None)
    }

    /// Validates a full-replace update payload.
    ///
    /// When `current` is provided (update by business identifier), an absent
    /// `clientId` keeps the current identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when a field is missing or malformed.
    pub fn into_update_fields(
        self,
        current: Option<&ClientId>,
    ) -> Result<ClientFields, ValidationError> {
        self.into_fields(current)
    }

    /// Shared create/update validation.
    fn into_fields(self, current: Option<&ClientId>) -> Result<ClientFields, ValidationError> {
        let client_id = non_empty(self.client_id).or_else(|| current.map(|id| id.as_str().to_string()));
        let name = non_empty(self.name);
        let email = non_empty(self.email);
        let mut missing = Vec::new();
        if client_id.is_none() {
            missing.push("clientId");
        }
        if name.is_none() {
            missing.push("name");
        }
        if email.is_none() {
            missing.push("email");
        }
        let (Some(client_id), Some(name), Some(email)) = (client_id, name, email) else {
            return Err(ValidationError::MissingFields(missing));
        };
        if !is_valid_email(&email) {
            return Err(ValidationError::InvalidEmail);
        }
        Ok(ClientFields {
            client_id: ClientId::new(client_id),
            name,
            email,
            phone: non_empty(self.phone),
        })
    }
}

/// Returns the trimmed value when it is present and non-empty.
fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|text| text.trim().to_string()).filter(|text| !text.is_empty())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
