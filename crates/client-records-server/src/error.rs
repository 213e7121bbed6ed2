// crates/client-records-server/src/error.rs
// ============================================================================
// Module: Record Service Errors
// Description: Error taxonomy and HTTP status mapping for the Record Service.
// Purpose: Turn validation, store, and handler failures into JSON responses.
// Dependencies: axum, client-records-core, serde_json, thiserror, tracing
// ============================================================================

//! ## Overview
//! [`ApiError`] is the single error type returned by request handlers. Every
//! variant renders as a JSON body with an `error` field plus safe context.
//! [`ServerError`] covers process-level failures (config, store open, bind).

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use client_records_core::ClientId;
use client_records_core::StoreError;
use client_records_core::ValidationError;
use serde_json::json;
use thiserror::Error;
use tokio::task::JoinError;
use tracing::error;

use crate::routes::ENDPOINTS;

// ============================================================================
// SECTION: API Errors
// ============================================================================

/// Request-level failures.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Payload or path parameter failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Request body exceeds the configured limit.
    #[error("Request body too large")]
    PayloadTooLarge,
    /// `clientId` already belongs to another record.
    #[error("Client ID already exists")]
    Duplicate(ClientId),
    /// No record matches the selector.
    #[error("Client not found")]
    NotFound,
    /// Storage layer fault.
    #[error("Database error")]
    Storage(String),
    /// No route matches the method and path.
    #[error("Endpoint not found")]
    RouteNotFound,
    /// Blocking store task panicked or was cancelled.
    #[error("Internal server error")]
    Handler(String),
}

impl ApiError {
    /// Returns the HTTP status for the error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Duplicate(_) => StatusCode::CONFLICT,
            Self::NotFound | Self::RouteNotFound => StatusCode::NOT_FOUND,
            Self::Storage(_) | Self::Handler(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::DuplicateKey {
                client_id,
            } => Self::Duplicate(client_id),
            StoreError::NotFound => Self::NotFound,
            fault => Self::Storage(fault.to_string()),
        }
    }
}

impl From<JoinError> for ApiError {
    fn from(error: JoinError) -> Self {
        Self::Handler(error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        let body = match self {
            Self::Duplicate(client_id) => json!({ "error": message, "clientId": client_id }),
            Self::Storage(details) => {
                error!(%details, "client store fault");
                json!({ "error": message, "details": details })
            }
            Self::Handler(details) => {
                error!(%details, "request handler fault");
                json!({ "error": message, "details": details })
            }
            Self::RouteNotFound => json!({
                "error": message,
                "availableEndpoints": ENDPOINTS.iter().map(|(route, _)| *route).collect::<Vec<_>>(),
            }),
            Self::Validation(_) | Self::PayloadTooLarge | Self::NotFound => {
                json!({ "error": message })
            }
        };
        (status, Json(body)).into_response()
    }
}

// ============================================================================
// SECTION: Server Errors
// ============================================================================

/// Process-level Record Service failures.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration is invalid.
    #[error("config error: {0}")]
    Config(String),
    /// Store could not be opened, initialized, or closed.
    #[error("store error: {0}")]
    Store(String),
    /// Listener or connection failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// Logging could not be installed.
    #[error("logging error: {0}")]
    Logging(String),
}
