// crates/client-records-server/src/server.rs
// ============================================================================
// Module: Record Service
// Description: Record Service assembly, serving, and graceful shutdown.
// Purpose: Open the client store, expose it over HTTP, close it after drain.
// Dependencies: axum, client-records-config, client-records-store-sqlite, tokio
// ============================================================================

//! ## Overview
//! [`RecordService`] owns the configured [`SharedClientStore`]. It initializes
//! the store on construction (schema plus default seed), serves the route
//! table until the shutdown future resolves, drains in-flight requests, and
//! only then closes the store handle.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use client_records_config::ClientRecordsConfig;
use client_records_core::ClientStore;
use client_records_core::SharedClientStore;
use client_records_store_sqlite::SqliteClientStore;
use tokio::net::TcpListener;
use tracing::error;
use tracing::info;

use crate::cors::CorsPolicy;
use crate::error::ServerError;
use crate::handlers::AppState;
use crate::routes::build_router;
use crate::shutdown::wait_for_shutdown_signal;

// ============================================================================
// SECTION: Record Service
// ============================================================================

/// Record Service instance.
pub struct RecordService {
    /// Validated configuration.
    config: ClientRecordsConfig,
    /// Shared handler state.
    state: Arc<AppState>,
    /// Origin policy applied to every response.
    cors: CorsPolicy,
}

impl RecordService {
    /// Builds the service from configuration, opening the `SQLite` store.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when the config is invalid or the store cannot
    /// be opened or initialized.
    pub fn from_config(config: ClientRecordsConfig) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let sqlite = SqliteClientStore::new(config.store.to_sqlite_config())
            .map_err(|err| ServerError::Store(err.to_string()))?;
        let location = sqlite.path().display().to_string();
        Self::with_store(config, SharedClientStore::from_store(sqlite), location)
    }

    /// Builds the service around an existing store.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when the config is invalid or the store cannot
    /// be initialized.
    pub fn with_store(
        config: ClientRecordsConfig,
        store: SharedClientStore,
        database_location: String,
    ) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let cors = CorsPolicy::new(&config.server.cors_allow_origin)?;
        let report = store.initialize().map_err(|err| ServerError::Store(err.to_string()))?;
        if report.seeded > 0 {
            info!(seeded = report.seeded, "client store seeded with defaults");
        }
        let state = Arc::new(AppState {
            store,
            started_at: Instant::now(),
            max_body_bytes: config.server.max_body_bytes,
            database_location,
        });
        Ok(Self {
            config,
            state,
            cors,
        })
    }

    /// Returns the route table bound to this service's state.
    #[must_use]
    pub fn router(&self) -> Router {
        build_router(Arc::clone(&self.state), self.cors.clone())
    }

    /// Binds the configured address and serves until SIGINT or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let addr = self.config.server.bind_addr().map_err(|err| ServerError::Config(err.to_string()))?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|err| ServerError::Transport(format!("bind {addr} failed: {err}")))?;
        self.serve_with_listener(listener, wait_for_shutdown_signal()).await
    }

    /// Serves on an already-bound listener until `shutdown` resolves, then
    /// drains connections and closes the store.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when serving fails or the store cannot be
    /// closed cleanly.
    pub async fn serve_with_listener<F>(
        self,
        listener: TcpListener,
        shutdown: F,
    ) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local = listener
            .local_addr()
            .map_err(|err| ServerError::Transport(err.to_string()))?;
        info!(
            addr = %local,
            database = %self.state.database_location,
            "client records service listening"
        );
        let served = axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|err| ServerError::Transport(err.to_string()));
        info!("shutting down; closing client store");
        let store = self.state.store.clone();
        let closed = tokio::task::spawn_blocking(move || store.close())
            .await
            .map_err(|err| ServerError::Store(err.to_string()))
            .and_then(|result| result.map_err(|err| ServerError::Store(err.to_string())));
        if let Err(err) = &closed {
            error!(error = %err, "client store close failed");
        }
        served?;
        closed
    }
}
