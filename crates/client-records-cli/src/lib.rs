// crates/client-records-cli/src/lib.rs
// ============================================================================
// Module: Client Records CLI Library
// Description: Form client used by the `client-records` binary.
// Purpose: Share the directory pull and webhook submission with tests.
// Dependencies: client-records-core, reqwest
// ============================================================================

//! ## Overview
//! Library half of the `client-records` CLI. It exposes the form client so the
//! binary and integration tests drive the same code.

pub mod form_client;

pub use form_client::ClientSelector;
pub use form_client::DEFAULT_TIMEOUT;
pub use form_client::DirectoryClient;
pub use form_client::FormClientError;
pub use form_client::OutcomeSubmission;
pub use form_client::WebhookClient;
pub use form_client::WebhookReceipt;
pub use form_client::resolve_client;
