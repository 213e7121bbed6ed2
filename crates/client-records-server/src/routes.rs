// crates/client-records-server/src/routes.rs
// ============================================================================
// Module: Record Service Routes
// Description: Route table for the Record Service.
// Dependencies: axum
// ============================================================================

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::get;

use crate::cors::CorsPolicy;
use crate::cors::apply_cors;
use crate::handlers;
use crate::handlers::SharedState;

/// Advertised endpoints and their purpose, listed by `/` and unmatched routes.
pub const ENDPOINTS: &[(&str, &str)] = &[
    ("GET /", "Service information"),
    ("GET /clients", "Get all clients (formatted for the booking form)"),
    ("GET /clients/raw", "Get all clients (raw database format)"),
    ("GET /clients/:id", "Get client by database ID"),
    ("GET /clients/clientId/:clientId", "Get client by Client ID (e.g., TB-001)"),
    ("POST /clients", "Create new client"),
    ("PUT /clients/:id", "Update client by database ID"),
    ("PUT /clients/clientId/:clientId", "Update client by Client ID"),
    ("DELETE /clients/:id", "Delete client by database ID"),
    ("DELETE /clients/clientId/:clientId", "Delete client by Client ID"),
    ("GET /stats", "Row count and server uptime"),
    ("GET /health", "Liveness check"),
];

/// Builds the Record Service router.
pub fn build_router(state: SharedState, cors: CorsPolicy) -> Router {
    let body_limit = state.max_body_bytes;
    Router::new()
        .route("/", get(handlers::service_info))
        .route("/clients", get(handlers::list_directory).post(handlers::create))
        .route("/clients/raw", get(handlers::list_raw))
        .route(
            "/clients/{id}",
            get(handlers::get_by_id).put(handlers::update_by_id).delete(handlers::delete_by_id),
        )
        .route(
            "/clients/clientId/{client_id}",
            get(handlers::get_by_client_id)
                .put(handlers::update_by_client_id)
                .delete(handlers::delete_by_client_id),
        )
        .route("/stats", get(handlers::stats))
        .route("/health", get(handlers::health))
        .fallback(handlers::route_not_found)
        .method_not_allowed_fallback(handlers::route_not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn_with_state(cors, apply_cors))
        .with_state(state)
}
