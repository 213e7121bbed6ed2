// crates/client-records-cli/tests/form_client.rs
// ============================================================================
// Module: Form Client Integration Tests
// Description: Directory pull and outcome submission against live servers.
// Purpose: Validate the form client against a real Record Service and a
//          webhook stub.
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use client_records_cli::ClientSelector;
use client_records_cli::DirectoryClient;
use client_records_cli::FormClientError;
use client_records_cli::OutcomeSubmission;
use client_records_cli::WebhookClient;
use client_records_cli::resolve_client;
use client_records_config::ClientRecordsConfig;
use client_records_core::Timestamp;
use client_records_server::RecordService;
use serde_json::Value;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

// ============================================================================
// SECTION: Harness
// ============================================================================

const TIMEOUT: Duration = Duration::from_secs(5);

/// Record service running on an ephemeral port.
struct RecordServiceHandle {
    base_url: String,
    shutdown: Option<oneshot::Sender<()>>,
    _dir: TempDir,
}

impl Drop for RecordServiceHandle {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

async fn spawn_record_service() -> RecordServiceHandle {
    let dir = TempDir::new().unwrap();
    let mut config = ClientRecordsConfig::default();
    config.store.path = dir.path().join("clients.db");
    let service = RecordService::from_config(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let (tx, rx) = oneshot::channel::<()>();
    tokio::spawn(service.serve_with_listener(listener, async move {
        let _ = rx.await;
    }));
    RecordServiceHandle {
        base_url,
        shutdown: Some(tx),
        _dir: dir,
    }
}

/// Webhook stub recording every posted body.
#[derive(Clone)]
struct WebhookState {
    status: StatusCode,
    received: Arc<Mutex<Vec<Value>>>,
}

async fn capture(State(state): State<WebhookState>, Json(body): Json<Value>) -> StatusCode {
    state.received.lock().unwrap().push(body);
    state.status
}

async fn spawn_webhook(status: StatusCode) -> (String, Arc<Mutex<Vec<Value>>>) {
    let received = Arc::new(Mutex::new(Vec::new()));
    let state = WebhookState {
        status,
        received: Arc::clone(&received),
    };
    let app = Router::new().route("/hook", post(capture)).with_state(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/hook", listener.local_addr().unwrap());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (url, received)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn pull_returns_seeded_directory() {
    let service = spawn_record_service().await;
    let client = DirectoryClient::new(&format!("{}/", service.base_url), TIMEOUT).unwrap();
    let snapshot = client.pull().await.unwrap();
    assert_eq!(snapshot.len(), 3);
    let mike = snapshot.get("mikewilson").unwrap();
    assert_eq!(mike.client_id, "TB-003");
    assert_eq!(mike.phone, "+44 7700 456789");
}

#[tokio::test(flavor = "multi_thread")]
async fn pull_reports_unreachable_service() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = DirectoryClient::new(&format!("http://{addr}"), TIMEOUT).unwrap();
    assert!(matches!(client.pull().await.unwrap_err(), FormClientError::Transport(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn submission_posts_flat_payload_once() {
    let service = spawn_record_service().await;
    let (webhook_url, received) = spawn_webhook(StatusCode::OK).await;

    let snapshot = DirectoryClient::new(&service.base_url, TIMEOUT).unwrap().pull().await.unwrap();
    let entry =
        resolve_client(&snapshot, &ClientSelector::ClientId("TB-002".to_string())).unwrap();
    let submission = OutcomeSubmission::for_entry(
        entry,
        "Booked",
        "Wants a follow-up call",
        "Meeting Record Form",
        Timestamp::now(),
    )
    .unwrap();
    let receipt = WebhookClient::new(&webhook_url, TIMEOUT).unwrap().submit(&submission).await.unwrap();
    assert_eq!(receipt.status, 200);

    let bodies = received.lock().unwrap().clone();
    assert_eq!(bodies.len(), 1);
    let body = &bodies[0];
    assert_eq!(body["name"], "Sarah Johnson");
    assert_eq!(body["email"], "sarah.johnson@email.com");
    assert_eq!(body["clientId"], "TB-002");
    assert_eq!(body["outcome"], "Booked");
    assert_eq!(body["details"], "Wants a follow-up call");
    assert_eq!(body["source"], "Meeting Record Form");
    assert!(Timestamp::parse_rfc3339(body["timestamp"].as_str().unwrap()).is_ok());
}

#[tokio::test(flavor = "multi_thread")]
async fn non_success_webhook_status_is_an_error() {
    let service = spawn_record_service().await;
    let (webhook_url, received) = spawn_webhook(StatusCode::INTERNAL_SERVER_ERROR).await;
    let snapshot = DirectoryClient::new(&service.base_url, TIMEOUT).unwrap().pull().await.unwrap();
    let entry = resolve_client(&snapshot, &ClientSelector::Key("johnsmith".to_string())).unwrap();
    let submission =
        OutcomeSubmission::for_entry(entry, "No show", "", "Meeting Record Form", Timestamp::now())
            .unwrap();
    let err = WebhookClient::new(&webhook_url, TIMEOUT).unwrap().submit(&submission).await.unwrap_err();
    match err {
        FormClientError::Status {
            status, ..
        } => assert_eq!(status, 500),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(received.lock().unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn pull_reports_non_success_status() {
    let (webhook_url, _) = spawn_webhook(StatusCode::OK).await;
    let base = webhook_url.trim_end_matches("/hook").to_string();
    let err = DirectoryClient::new(&base, TIMEOUT).unwrap().pull().await.unwrap_err();
    match err {
        FormClientError::Status {
            status, ..
        } => assert_eq!(status, 404),
        other => panic!("unexpected error: {other:?}"),
    }
}
