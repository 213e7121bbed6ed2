// crates/client-records-core/src/seed.rs
// ============================================================================
// Module: Seed Records
// Description: Example clients inserted into an empty store.
// Dependencies: crate::record
// ============================================================================

use crate::record::ClientFields;
use crate::record::ClientId;

/// Returns the three example clients seeded into a freshly empty store.
#[must_use]
pub fn default_clients() -> Vec<ClientFields> {
    [
        ("TB-001", "John Smith", "john.smith@email.com", "+44 7700 123456"),
        ("TB-002", "Sarah Johnson", "sarah.johnson@email.com", "+44 7700 789123"),
        ("TB-003", "Mike Wilson", "mike.wilson@email.com", "+44 7700 456789"),
    ]
    .into_iter()
    .map(|(client_id, name, email, phone)| ClientFields {
        client_id: ClientId::new(client_id),
        name: name.to_string(),
        email: email.to_string(),
        phone: Some(phone.to_string()),
    })
    .collect()
}
