// crates/client-records-server/src/cors.rs
// ============================================================================
// Module: Cross-Origin Access
// Description: Minimal CORS layer for the browser form client.
// Dependencies: axum
// ============================================================================

//! ## Overview
//! Answers preflight `OPTIONS` requests directly and stamps
//! `Access-Control-Allow-Origin` on every other response.

use axum::body::Body;
use axum::extract::Request;
use axum::extract::State;
use axum::http::HeaderValue;
use axum::http::Method;
use axum::http::StatusCode;
use axum::http::header::ACCESS_CONTROL_ALLOW_HEADERS;
use axum::http::header::ACCESS_CONTROL_ALLOW_METHODS;
use axum::http::header::ACCESS_CONTROL_ALLOW_ORIGIN;
use axum::http::header::ACCESS_CONTROL_MAX_AGE;
use axum::http::header::ACCESS_CONTROL_REQUEST_HEADERS;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ServerError;

/// Methods advertised in preflight responses.
const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
/// Headers allowed when the preflight does not name any.
const DEFAULT_ALLOWED_HEADERS: &str = "Content-Type";
/// Preflight cache lifetime in seconds.
const PREFLIGHT_MAX_AGE: &str = "600";

/// Allowed origin for cross-origin callers.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    /// Value of `Access-Control-Allow-Origin`.
    allow_origin: HeaderValue,
}

impl CorsPolicy {
    /// Builds a policy for a configured origin (`*` or an exact origin).
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Config`] when the origin is not a valid header
    /// value.
    pub fn new(origin: &str) -> Result<Self, ServerError> {
        let allow_origin = HeaderValue::from_str(origin.trim())
            .map_err(|_| ServerError::Config("invalid cors_allow_origin".to_string()))?;
        Ok(Self {
            allow_origin,
        })
    }
}

/// Middleware applying the CORS policy.
pub async fn apply_cors(State(policy): State<CorsPolicy>, request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let allow_headers = request
            .headers()
            .get(ACCESS_CONTROL_REQUEST_HEADERS)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_ALLOWED_HEADERS));
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        let headers = response.headers_mut();
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, policy.allow_origin);
        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOWED_METHODS));
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, allow_headers);
        headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(PREFLIGHT_MAX_AGE));
        return response;
    }
    let mut response = next.run(request).await;
    response.headers_mut().insert(ACCESS_CONTROL_ALLOW_ORIGIN, policy.allow_origin);
    response
}
