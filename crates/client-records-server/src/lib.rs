// crates/client-records-server/src/lib.rs
// ============================================================================
// Module: Client Records Server Library
// Description: JSON-over-HTTP Record Service for client contact records.
// Purpose: Expose CRUD endpoints over the ClientStore with validation.
// Dependencies: client-records-core, client-records-store-sqlite, axum, tokio
// ============================================================================

//! ## Overview
//! The Record Service translates REST requests into parameterized store
//! calls. Input is validated before storage; store outcomes map onto HTTP
//! statuses with JSON error bodies.

pub mod cors;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod routes;
pub mod server;
pub mod shutdown;

pub use error::ApiError;
pub use error::ServerError;
pub use handlers::SERVICE_VERSION;
pub use logging::init_logging;
pub use routes::ENDPOINTS;
pub use server::RecordService;
pub use shutdown::wait_for_shutdown_signal;
