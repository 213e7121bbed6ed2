// crates/client-records-server/src/handlers.rs
// ============================================================================
// Module: Record Service Handlers
// Description: HTTP handlers translating REST calls into ClientStore calls.
// Purpose: Validate input, run store calls on the blocking pool, shape JSON.
// Dependencies: axum, client-records-core, serde, serde_json, tokio
// ============================================================================

//! ## Overview
//! Each handler validates its input before touching storage, then runs exactly
//! one synchronous store call on the blocking pool and awaits it. Failures are
//! reported through [`ApiError`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::body::Bytes;
use axum::extract::Path;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::extract::rejection::PathRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use client_records_core::ClientFields;
use client_records_core::ClientId;
use client_records_core::ClientInput;
use client_records_core::ClientKey;
use client_records_core::ClientRecord;
use client_records_core::ClientStore;
use client_records_core::DirectorySnapshot;
use client_records_core::RecordId;
use client_records_core::SharedClientStore;
use client_records_core::StoreError;
use client_records_core::Timestamp;
use client_records_core::ValidationError;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

use crate::error::ApiError;
use crate::routes::ENDPOINTS;

// ============================================================================
// SECTION: State
// ============================================================================

/// Service version reported by `/` and `/stats`.
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Shared handler state.
pub struct AppState {
    /// Client store handle.
    pub store: SharedClientStore,
    /// Process start, for uptime reporting.
    pub started_at: Instant,
    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,
    /// Human-readable store location for `/`.
    pub database_location: String,
}

impl AppState {
    /// Seconds since the service started.
    fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

/// Shared state handle passed to handlers.
pub type SharedState = Arc<AppState>;

// ============================================================================
// SECTION: Response Shapes
// ============================================================================

/// `{clients, count}` listing.
#[derive(Debug, Serialize)]
struct ClientListing<T> {
    /// Directory snapshot or raw rows.
    clients: T,
    /// Number of stored rows.
    count: usize,
}

/// Single record lookup.
#[derive(Debug, Serialize)]
struct ClientEnvelope {
    /// Matching record.
    client: ClientRecord,
}

/// Create/update acknowledgement.
#[derive(Debug, Serialize)]
struct MutationResponse {
    /// Always true.
    success: bool,
    /// Human-readable outcome.
    message: &'static str,
    /// Record after the mutation.
    client: ClientRecord,
}

/// Delete acknowledgement.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteResponse {
    /// Always true.
    success: bool,
    /// Human-readable outcome.
    message: &'static str,
    /// Record as it was before deletion.
    deleted_client: ClientRecord,
}

/// `/stats` body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    /// Stored row count.
    total_clients: u64,
    /// Most recent insertion time.
    latest_client: Option<Timestamp>,
    /// Process facts.
    server: ServerFacts,
}

/// Process facts embedded in `/stats`.
#[derive(Debug, Serialize)]
struct ServerFacts {
    /// Seconds since start.
    uptime: u64,
    /// Service version.
    version: &'static str,
}

/// `/health` body.
#[derive(Debug, Serialize)]
struct HealthResponse {
    /// Always `healthy`.
    status: &'static str,
    /// Current time.
    timestamp: Timestamp,
    /// Seconds since start.
    uptime: u64,
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Runs one store call on the blocking pool.
async fn with_store<T, F>(state: &AppState, call: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&SharedClientStore) -> Result<T, StoreError> + Send + 'static,
{
    let store = state.store.clone();
    let outcome = tokio::task::spawn_blocking(move || call(&store)).await?;
    outcome.map_err(ApiError::from)
}

/// Parses a surrogate id path segment.
fn parse_record_id(raw: &str) -> Result<RecordId, ApiError> {
    RecordId::parse(raw).ok_or(ApiError::Validation(ValidationError::InvalidId))
}

/// Extracts a surrogate id, reporting undecodable segments as `InvalidId`.
fn record_id_from_path(path: Result<Path<String>, PathRejection>) -> Result<RecordId, ApiError> {
    let Path(raw) = path.map_err(|_| ApiError::Validation(ValidationError::InvalidId))?;
    parse_record_id(&raw)
}

/// Extracts a business identifier from the path.
fn client_id_from_path(path: Result<Path<String>, PathRejection>) -> Result<ClientId, ApiError> {
    let Path(raw) = path.map_err(|_| ApiError::Validation(ValidationError::InvalidClientId))?;
    Ok(ClientId::new(raw))
}

/// Extracts and parses a JSON body within the configured limit.
fn parse_body(state: &AppState, body: Result<Bytes, BytesRejection>) -> Result<ClientInput, ApiError> {
    let bytes = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::Validation(ValidationError::MalformedBody(rejection.body_text()))
        }
    })?;
    if bytes.len() > state.max_body_bytes {
        return Err(ApiError::PayloadTooLarge);
    }
    Ok(ClientInput::from_json_slice(&bytes)?)
}

// ============================================================================
// SECTION: Service Info
// ============================================================================

/// `GET /`
pub async fn service_info(State(state): State<SharedState>) -> Json<Value> {
    let endpoints: Map<String, Value> = ENDPOINTS
        .iter()
        .map(|(route, purpose)| ((*route).to_string(), Value::from(*purpose)))
        .collect();
    Json(json!({
        "status": "Client Records service is running",
        "version": SERVICE_VERSION,
        "endpoints": endpoints,
        "database": {
            "location": state.database_location,
            "status": "Connected",
        },
    }))
}

/// `GET /stats`
pub async fn stats(State(state): State<SharedState>) -> Result<Response, ApiError> {
    let stats = with_store(&state, |store| store.stats()).await?;
    Ok(Json(StatsResponse {
        total_clients: stats.total_clients,
        latest_client: stats.latest_created_at,
        server: ServerFacts {
            uptime: state.uptime_secs(),
            version: SERVICE_VERSION,
        },
    })
    .into_response())
}

/// `GET /health`
pub async fn health(State(state): State<SharedState>) -> Response {
    Json(HealthResponse {
        status: "healthy",
        timestamp: Timestamp::now(),
        uptime: state.uptime_secs(),
    })
    .into_response()
}

/// Fallback for unmatched routes and methods.
pub async fn route_not_found() -> ApiError {
    ApiError::RouteNotFound
}

// ============================================================================
// SECTION: Reads
// ============================================================================

/// `GET /clients`
pub async fn list_directory(State(state): State<SharedState>) -> Result<Response, ApiError> {
    let rows = with_store(&state, |store| store.list()).await?;
    let snapshot = DirectorySnapshot::from_records(&rows);
    Ok(Json(ClientListing {
        clients: snapshot,
        count: rows.len(),
    })
    .into_response())
}

/// `GET /clients/raw`
pub async fn list_raw(State(state): State<SharedState>) -> Result<Response, ApiError> {
    let rows = with_store(&state, |store| store.list()).await?;
    let count = rows.len();
    Ok(Json(ClientListing {
        clients: rows,
        count,
    })
    .into_response())
}

/// `GET /clients/{id}`
pub async fn get_by_id(
    State(state): State<SharedState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    let id = record_id_from_path(path)?;
    let client = with_store(&state, move |store| store.get_by_id(id)).await?;
    Ok(Json(ClientEnvelope {
        client,
    })
    .into_response())
}

/// `GET /clients/clientId/{clientId}`
pub async fn get_by_client_id(
    State(state): State<SharedState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    let client_id = client_id_from_path(path)?;
    let client = with_store(&state, move |store| store.get_by_client_id(&client_id)).await?;
    Ok(Json(ClientEnvelope {
        client,
    })
    .into_response())
}

// ============================================================================
// SECTION: Mutations
// ============================================================================

/// `POST /clients`
pub async fn create(
    State(state): State<SharedState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, ApiError> {
    let fields = parse_body(&state, body)?.into_create_fields()?;
    let client = with_store(&state, move |store| store.insert(&fields)).await?;
    Ok((
        StatusCode::CREATED,
        Json(MutationResponse {
            success: true,
            message: "Client created successfully",
            client,
        }),
    )
        .into_response())
}

/// `PUT /clients/{id}`
pub async fn update_by_id(
    State(state): State<SharedState>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, ApiError> {
    let id = record_id_from_path(path)?;
    let fields = parse_body(&state, body)?.into_update_fields(None)?;
    update(&state, ClientKey::Id(id), fields).await
}

/// `PUT /clients/clientId/{clientId}`
pub async fn update_by_client_id(
    State(state): State<SharedState>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, ApiError> {
    let client_id = client_id_from_path(path)?;
    let fields = parse_body(&state, body)?.into_update_fields(Some(&client_id))?;
    update(&state, ClientKey::ClientId(client_id), fields).await
}

/// Shared update path for both selectors.
async fn update(
    state: &AppState,
    key: ClientKey,
    fields: ClientFields,
) -> Result<Response, ApiError> {
    let client = with_store(state, move |store| store.update(&key, &fields)).await?;
    Ok(Json(MutationResponse {
        success: true,
        message: "Client updated successfully",
        client,
    })
    .into_response())
}

/// `DELETE /clients/{id}`
pub async fn delete_by_id(
    State(state): State<SharedState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    let id = record_id_from_path(path)?;
    delete(&state, ClientKey::Id(id)).await
}

/// `DELETE /clients/clientId/{clientId}`
pub async fn delete_by_client_id(
    State(state): State<SharedState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    let client_id = client_id_from_path(path)?;
    delete(&state, ClientKey::ClientId(client_id)).await
}

/// Shared delete path for both selectors.
async fn delete(state: &AppState, key: ClientKey) -> Result<Response, ApiError> {
    let deleted_client = with_store(state, move |store| store.delete(&key)).await?;
    Ok(Json(DeleteResponse {
        success: true,
        message: "Client deleted successfully",
        deleted_client,
    })
    .into_response())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
