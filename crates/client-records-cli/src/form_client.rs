// crates/client-records-cli/src/form_client.rs
// ============================================================================
// Module: Form Client
// Description: HTTP client for the directory pull and outcome submission.
// Purpose: Fetch the client directory and post meeting outcomes to a webhook.
// Dependencies: client-records-core, reqwest, serde, serde_json
// ============================================================================

//! ## Overview
//! The form client has two one-way interactions. [`DirectoryClient::pull`]
//! fetches `GET {service}/clients` into an immutable [`DirectorySnapshot`];
//! [`WebhookClient::submit`] posts a flat [`OutcomeSubmission`] to the
//! automation webhook. Each call is awaited and returns a `Result`; nothing is
//! cached between calls.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use client_records_core::DirectoryEntry;
use client_records_core::DirectorySnapshot;
use client_records_core::Timestamp;
use reqwest::Client;
use reqwest::redirect::Policy;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default request timeout for form client calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Maximum directory response size in bytes.
pub const MAX_DIRECTORY_BYTES: usize = 4 * 1024 * 1024;
/// Maximum webhook response body kept for error reporting.
const MAX_WEBHOOK_RESPONSE_BYTES: usize = 64 * 1024;
/// Maximum characters of a response body echoed in errors.
const ERROR_PREVIEW_CHARS: usize = 200;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Form client errors.
#[derive(Debug, Error)]
pub enum FormClientError {
    /// Client configuration is invalid.
    #[error("form client config error: {0}")]
    Config(String),
    /// Network or HTTP transport failure.
    #[error("form client transport error: {0}")]
    Transport(String),
    /// Remote answered with a non-success status.
    #[error("http status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Truncated response body.
        body: String,
    },
    /// Response body could not be decoded.
    #[error("form client protocol error: {0}")]
    Protocol(String),
    /// Response body exceeded the size limit.
    #[error("response exceeds size limit: {actual} > {limit}")]
    ResponseTooLarge {
        /// Bytes received.
        actual: usize,
        /// Maximum allowed bytes.
        limit: usize,
    },
    /// No directory entry matches the selector.
    #[error("unknown client: {0}")]
    UnknownClient(String),
    /// Submission input is invalid.
    #[error("invalid submission: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Directory Pull
// ============================================================================

/// `GET /clients` body.
#[derive(Debug, Deserialize)]
struct DirectoryListing {
    /// Directory keyed by derived name key.
    clients: DirectorySnapshot,
}

/// Client for the record service directory.
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    /// HTTP client.
    client: Client,
    /// Record service base URL without trailing slash.
    service_url: String,
}

impl DirectoryClient {
    /// Builds a directory client for a record service base URL.
    ///
    /// # Errors
    ///
    /// Returns [`FormClientError`] when the URL is empty or the HTTP client
    /// cannot be built.
    pub fn new(service_url: &str, timeout: Duration) -> Result<Self, FormClientError> {
        let service_url = service_url.trim().trim_end_matches('/').to_string();
        if service_url.is_empty() {
            return Err(FormClientError::Config("service url must be set".to_string()));
        }
        Ok(Self {
            client: build_http_client(timeout)?,
            service_url,
        })
    }

    /// Fetches the current directory.
    ///
    /// # Errors
    ///
    /// Returns [`FormClientError`] when the request fails, the service answers
    /// with a non-success status, or the body is not a directory listing.
    pub async fn pull(&self) -> Result<DirectorySnapshot, FormClientError> {
        let url = format!("{}/clients", self.service_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| FormClientError::Transport(err.to_string()))?;
        let status = response.status();
        let body = read_body_with_limit(response, MAX_DIRECTORY_BYTES).await?;
        if !status.is_success() {
            return Err(status_error(status.as_u16(), &body));
        }
        let listing: DirectoryListing = serde_json::from_slice(&body)
            .map_err(|err| FormClientError::Protocol(format!("invalid directory listing: {err}")))?;
        Ok(listing.clients)
    }
}

/// How a user picks a client from the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientSelector {
    /// Derived directory key (e.g. `johnsmith`).
    Key(String),
    /// Business identifier (e.g. `TB-001`).
    ClientId(String),
}

/// Looks up the directory entry for a selector.
///
/// # Errors
///
/// Returns [`FormClientError::UnknownClient`] when nothing matches.
pub fn resolve_client<'a>(
    snapshot: &'a DirectorySnapshot,
    selector: &ClientSelector,
) -> Result<&'a DirectoryEntry, FormClientError> {
    let found = match selector {
        ClientSelector::Key(key) => snapshot.get(key.trim()),
        ClientSelector::ClientId(client_id) => snapshot.find_by_client_id(client_id.trim()),
    };
    found.ok_or_else(|| {
        let label = match selector {
            ClientSelector::Key(key) | ClientSelector::ClientId(key) => key.clone(),
        };
        FormClientError::UnknownClient(label)
    })
}

// ============================================================================
// SECTION: Outcome Submission
// ============================================================================

/// Flat outcome payload posted to the automation webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeSubmission {
    /// Client display name.
    pub name: String,
    /// Client email.
    pub email: String,
    /// Client phone, empty when unknown.
    pub phone: String,
    /// Business identifier.
    #[serde(rename = "clientId")]
    pub client_id: String,
    /// Free-text meeting notes.
    pub details: String,
    /// Selected meeting outcome.
    pub outcome: String,
    /// Submission time.
    pub timestamp: Timestamp,
    /// Origin label.
    pub source: String,
}

impl OutcomeSubmission {
    /// Builds a submission for a directory entry.
    ///
    /// # Errors
    ///
    /// Returns [`FormClientError::Invalid`] when the outcome or source is
    /// empty.
    pub fn for_entry(
        entry: &DirectoryEntry,
        outcome: &str,
        details: &str,
        source: &str,
        timestamp: Timestamp,
    ) -> Result<Self, FormClientError> {
        let outcome = outcome.trim();
        if outcome.is_empty() {
            return Err(FormClientError::Invalid("outcome must be non-empty".to_string()));
        }
        let source = source.trim();
        if source.is_empty() {
            return Err(FormClientError::Invalid("source must be non-empty".to_string()));
        }
        Ok(Self {
            name: entry.name.clone(),
            email: entry.email.clone(),
            phone: entry.phone.clone(),
            client_id: entry.client_id.clone(),
            details: details.to_string(),
            outcome: outcome.to_string(),
            timestamp,
            source: source.to_string(),
        })
    }
}

/// Acknowledgement from the webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WebhookReceipt {
    /// HTTP status returned by the webhook.
    pub status: u16,
}

/// Client for the automation webhook.
#[derive(Debug, Clone)]
pub struct WebhookClient {
    /// HTTP client.
    client: Client,
    /// Webhook URL.
    url: String,
}

impl WebhookClient {
    /// Builds a webhook client.
    ///
    /// # Errors
    ///
    /// Returns [`FormClientError`] when the URL is empty or the HTTP client
    /// cannot be built.
    pub fn new(url: &str, timeout: Duration) -> Result<Self, FormClientError> {
        let url = url.trim().to_string();
        if url.is_empty() {
            return Err(FormClientError::Config("webhook url must be set".to_string()));
        }
        Ok(Self {
            client: build_http_client(timeout)?,
            url,
        })
    }

    /// Posts one submission. Exactly one request is sent; failures are not
    /// retried.
    ///
    /// # Errors
    ///
    /// Returns [`FormClientError::Status`] when the webhook answers with a
    /// non-2xx status, or [`FormClientError::Transport`] when it is
    /// unreachable.
    pub async fn submit(
        &self,
        submission: &OutcomeSubmission,
    ) -> Result<WebhookReceipt, FormClientError> {
        let response = self
            .client
            .post(&self.url)
            .json(submission)
            .send()
            .await
            .map_err(|err| FormClientError::Transport(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = read_body_with_limit(response, MAX_WEBHOOK_RESPONSE_BYTES)
                .await
                .unwrap_or_default();
            return Err(status_error(status.as_u16(), &body));
        }
        Ok(WebhookReceipt {
            status: status.as_u16(),
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds an HTTP client with a timeout and no redirects.
fn build_http_client(timeout: Duration) -> Result<Client, FormClientError> {
    Client::builder()
        .timeout(timeout)
        .redirect(Policy::none())
        .build()
        .map_err(|err| FormClientError::Transport(err.to_string()))
}

/// Builds a status error with a short body preview.
fn status_error(status: u16, body: &[u8]) -> FormClientError {
    let preview: String = String::from_utf8_lossy(body).trim().chars().take(ERROR_PREVIEW_CHARS).collect();
    FormClientError::Status {
        status,
        body: preview,
    }
}

/// Reads a response body while enforcing a hard byte limit.
async fn read_body_with_limit(
    mut response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FormClientError> {
    let mut body = Vec::new();
    while let Some(chunk) =
        response.chunk().await.map_err(|err| FormClientError::Transport(err.to_string()))?
    {
        let next_total = body.len().saturating_add(chunk.len());
        if next_total > limit {
            return Err(FormClientError::ResponseTooLarge {
                actual: next_total,
                limit,
            });
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
