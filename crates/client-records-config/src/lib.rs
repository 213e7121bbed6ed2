// crates/client-records-config/src/lib.rs
// ============================================================================
// Module: Client Records Config
// Description: Canonical configuration model for the client records service.
// Purpose: Single source of truth for config loading and validation.
// Dependencies: client-records-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Loads `client-records.toml`, applies the `PORT` override, and validates
//! every section before the service or form client uses it.

pub mod config;

pub use config::CONFIG_ENV_VAR;
pub use config::ClientRecordsConfig;
pub use config::ConfigError;
pub use config::DEFAULT_CONFIG_NAME;
pub use config::FormConfig;
pub use config::LogFormat;
pub use config::LoggingConfig;
pub use config::PORT_ENV_VAR;
pub use config::ServerConfig;
pub use config::StoreConfig;
