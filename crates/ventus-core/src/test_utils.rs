//! Test utilities for ventus-core
//!
//! This module provides a mock of the enrichment and personalization
//! functions that can be used for development and integration tests.
//! Classification and deal copy come from [`MockBackend`], so results over
//! HTTP match the in-process mock.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Json, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::ai::{
    AIBackend, DealMessage, EnrichmentRequest, EnrichmentResult, MockBackend,
    PersonalizationRequest,
};
use crate::models::Transaction;

/// How the mock service answers
#[derive(Debug, Clone, Copy, PartialEq)]
enum Behavior {
    Ok,
    /// Every function call returns 500
    Failing,
    /// Responses are held back for the given delay
    Slow(Duration),
}

struct ServerState {
    behavior: Behavior,
    backend: MockBackend,
    enrich_calls: AtomicUsize,
    personalize_calls: AtomicUsize,
    last_authorization: Mutex<Option<String>>,
}

/// Mock enrichment service for testing and development
pub struct MockEnrichmentServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockEnrichmentServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        Self::start_with(Behavior::Ok).await
    }

    /// Start a server whose functions always answer 500
    pub async fn start_failing() -> Self {
        Self::start_with(Behavior::Failing).await
    }

    /// Start a server that waits `delay` before every response
    pub async fn start_slow(delay: Duration) -> Self {
        Self::start_with(Behavior::Slow(delay)).await
    }

    async fn start_with(behavior: Behavior) -> Self {
        let state = Arc::new(ServerState {
            behavior,
            backend: MockBackend::new(),
            enrich_calls: AtomicUsize::new(0),
            personalize_calls: AtomicUsize::new(0),
            last_authorization: Mutex::new(None),
        });

        let app = Router::new()
            .route("/enrich-transactions", post(handle_enrich))
            .route("/personalize-deals", post(handle_personalize))
            .route("/health", get(handle_health))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock enrichment server");
        let addr = listener.local_addr().expect("mock server address");

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await;
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of enrichment requests received (one per batch)
    pub fn enrich_calls(&self) -> usize {
        self.state.enrich_calls.load(Ordering::SeqCst)
    }

    pub fn personalize_calls(&self) -> usize {
        self.state.personalize_calls.load(Ordering::SeqCst)
    }

    /// Authorization header of the most recent function call
    pub fn last_authorization(&self) -> Option<String> {
        self.state
            .last_authorization
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockEnrichmentServer {
    fn drop(&mut self) {
        self.stop();
    }
}

impl ServerState {
    /// Shared prologue for function calls; returns an error response when
    /// the server is configured to fail
    async fn begin(&self, headers: &HeaderMap) -> Option<Response> {
        if let Ok(mut guard) = self.last_authorization.lock() {
            *guard = headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(String::from);
        }
        match self.behavior {
            Behavior::Ok => None,
            Behavior::Failing => Some(
                (StatusCode::INTERNAL_SERVER_ERROR, "enrichment unavailable").into_response(),
            ),
            Behavior::Slow(delay) => {
                tokio::time::sleep(delay).await;
                None
            }
        }
    }
}

/// Enrichment function
async fn handle_enrich(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Json(request): Json<EnrichmentRequest>,
) -> Response {
    state.enrich_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(response) = state.begin(&headers).await {
        return response;
    }

    let transactions: Vec<Transaction> = request
        .transactions
        .into_iter()
        .filter_map(|item| {
            Some(Transaction {
                id: item.id,
                date: item.date.parse().ok()?,
                description: item.description,
                merchant: item.merchant,
                amount: item.amount,
                zip_code: item.zip_code,
            })
        })
        .collect();

    match state.backend.enrich_transactions(&transactions).await {
        Ok(results) => Json(EnrichResponseBody { results }).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// Personalization function
async fn handle_personalize(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Json(request): Json<PersonalizationRequest>,
) -> Response {
    state.personalize_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(response) = state.begin(&headers).await {
        return response;
    }

    match state
        .backend
        .personalize_deals(&request.deals, &request.profile)
        .await
    {
        Ok(messages) => Json(PersonalizeResponseBody { messages }).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn handle_health(State(state): State<Arc<ServerState>>) -> Response {
    match state.behavior {
        Behavior::Failing => StatusCode::SERVICE_UNAVAILABLE.into_response(),
        _ => Json(HealthResponse { status: "ok".into() }).into_response(),
    }
}

// Response types for the mock server

#[derive(Debug, Serialize)]
struct EnrichResponseBody {
    results: Vec<EnrichmentResult>,
}

#[derive(Debug, Serialize)]
struct PersonalizeResponseBody {
    messages: std::collections::BTreeMap<String, DealMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct HealthResponse {
    status: String,
}
