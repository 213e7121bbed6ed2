// crates/client-records-core/src/lib.rs
// ============================================================================
// Module: Client Records Core Library
// Description: Public API surface for the client records domain.
// Purpose: Expose record types, validation, directory, and the store seam.
// Dependencies: crate::{record, validation, directory, store, memory, seed}
// ============================================================================

//! ## Overview
//! Client records core holds everything the Record Service and its consumers
//! share: the [`ClientRecord`] model, input validation, the form-friendly
//! [`DirectorySnapshot`], and the [`ClientStore`] persistence seam. It is
//! backend-agnostic; the durable store lives in `client-records-store-sqlite`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod directory;
pub mod memory;
pub mod record;
pub mod seed;
pub mod store;
pub mod validation;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use directory::DirectoryEntry;
pub use directory::DirectorySnapshot;
pub use directory::directory_key;
pub use memory::InMemoryClientStore;
pub use record::ClientFields;
pub use record::ClientId;
pub use record::ClientKey;
pub use record::ClientRecord;
pub use record::RecordId;
pub use record::Timestamp;
pub use seed::default_clients;
pub use store::ClientStore;
pub use store::InitReport;
pub use store::SharedClientStore;
pub use store::StoreError;
pub use store::StoreStats;
pub use validation::ClientInput;
pub use validation::ValidationError;
pub use validation::is_valid_email;
