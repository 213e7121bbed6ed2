// crates/client-records-server/src/logging.rs
// ============================================================================
// Module: Logging
// Description: tracing subscriber installation for the Record Service.
// Dependencies: client-records-config, tracing-subscriber
// ============================================================================

use client_records_config::LogFormat;
use client_records_config::LoggingConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::ServerError;

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured filter. Events go to
/// stderr so command output on stdout stays machine-readable.
///
/// # Errors
///
/// Returns [`ServerError::Logging`] when the filter is invalid or a global
/// subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ServerError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(config.filter.trim())
            .map_err(|err| ServerError::Logging(err.to_string()))?,
    };
    let registry = tracing_subscriber::registry().with(filter);
    let installed = match config.format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Text => {
            registry.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)).try_init()
        }
    };
    installed.map_err(|err| ServerError::Logging(err.to_string()))
}
