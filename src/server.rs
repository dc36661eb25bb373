//! JSON HTTP API over the case corpus.
//!
//! Exposes search, similar-case lookup, case details, and corpus statistics
//! on a small axum router, suitable for a browser frontend or direct curl use.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | API index |
//! | `GET`  | `/health` | Health check (returns version) |
//! | `POST` | `/search` | Semantic search (JSON body) |
//! | `GET`  | `/search` | Semantic search (query string, for browser testing) |
//! | `GET`  | `/similar/{case_id}` | Cases similar to a stored case |
//! | `GET`  | `/case/{case_id}` | Full case details without the vector |
//! | `GET`  | `/stats` | Corpus counters |
//!
//! # Error Contract
//!
//! All error responses share one envelope:
//!
//! ```json
//! { "error": { "code": "not_found", "message": "case not found: 1998_a_12" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `internal` (500).
//! A similarity query against a case that was never embedded is treated as
//! an addressing error and returns 404.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so browser-based clients
//! can call the API directly.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::embedding::EmbeddingClient;
use crate::get::{self, CaseDetails};
use crate::models::{CorpusStats, SearchResult};
use crate::search;
use crate::stats;
use crate::store::CaseStore;

/// Upper bound on `top_k` accepted from clients.
const MAX_TOP_K: usize = 50;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    store: Arc<dyn CaseStore>,
    client: Arc<dyn EmbeddingClient>,
}

/// Starts the HTTP server.
///
/// Binds to `[server].host:[server].port` and serves until the process is
/// terminated. The embedding client is only exercised by the search routes,
/// so `/case`, `/stats`, and `/health` keep working while a remote embedding
/// backend is down.
pub async fn run_server(
    config: &Config,
    store: Arc<dyn CaseStore>,
    client: Arc<dyn EmbeddingClient>,
) -> anyhow::Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    let state = AppState {
        config: Arc::new(config.clone()),
        store,
        client,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(handle_index))
        .route("/health", get(handle_health))
        .route("/search", post(handle_search_post).get(handle_search_get))
        .route("/similar/{case_id}", get(handle_similar))
        .route("/case/{case_id}", get(handle_case))
        .route("/stats", get(handle_stats))
        .layer(cors)
        .with_state(state);

    println!("API server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

/// Maps core errors to HTTP statuses by inspecting the message, so the
/// retrieval layer does not need a dedicated error type.
fn classify_error(err: anyhow::Error) -> AppError {
    let msg = err.to_string();

    if msg.contains("not found") || msg.contains("no embedding") {
        not_found(msg)
    } else {
        internal(msg)
    }
}

// ============ GET / ============

async fn handle_index() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "lexcorpus",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "/health": "Health check",
            "/search": "Semantic search over judgments (POST body or GET query string)",
            "/similar/{case_id}": "Cases similar to a stored case",
            "/case/{case_id}": "Full case details",
            "/stats": "Corpus statistics"
        }
    }))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ /search ============

#[derive(Debug, Deserialize)]
struct SearchRequest {
    query: String,
    top_k: Option<usize>,
    court: Option<String>,
}

/// Query-string form of [`SearchRequest`] for `GET /search?q=...`.
#[derive(Debug, Deserialize)]
struct SearchParams {
    q: String,
    top_k: Option<usize>,
    court: Option<String>,
}

#[derive(Serialize)]
struct SearchResponse {
    query: String,
    total_results: usize,
    results: Vec<SearchResult>,
}

async fn run_text_search(
    state: &AppState,
    query: &str,
    top_k: Option<usize>,
    court: Option<&str>,
) -> Result<SearchResponse, AppError> {
    if query.trim().is_empty() {
        return Err(bad_request("query must not be empty"));
    }

    let top_k = top_k
        .unwrap_or(state.config.retrieval.top_k)
        .clamp(1, MAX_TOP_K);

    let results = search::search_by_text(
        state.store.as_ref(),
        state.client.as_ref(),
        query,
        top_k,
        court,
    )
    .await
    .map_err(classify_error)?;

    Ok(SearchResponse {
        query: query.to_string(),
        total_results: results.len(),
        results,
    })
}

async fn handle_search_post(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    let resp = run_text_search(&state, &req.query, req.top_k, req.court.as_deref()).await?;
    Ok(Json(resp))
}

async fn handle_search_get(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, AppError> {
    let resp = run_text_search(&state, &params.q, params.top_k, params.court.as_deref()).await?;
    Ok(Json(resp))
}

// ============ GET /similar/{case_id} ============

#[derive(Debug, Deserialize)]
struct SimilarParams {
    top_k: Option<usize>,
    court: Option<String>,
}

#[derive(Serialize)]
struct SimilarResponse {
    source_case_id: String,
    total_results: usize,
    results: Vec<SearchResult>,
}

async fn handle_similar(
    State(state): State<AppState>,
    Path(case_id): Path<String>,
    Query(params): Query<SimilarParams>,
) -> Result<Json<SimilarResponse>, AppError> {
    let top_k = params
        .top_k
        .unwrap_or(state.config.retrieval.top_k)
        .clamp(1, MAX_TOP_K);

    let results = search::search_by_case(
        state.store.as_ref(),
        &case_id,
        top_k,
        params.court.as_deref(),
    )
    .await
    .map_err(classify_error)?;

    Ok(Json(SimilarResponse {
        source_case_id: case_id,
        total_results: results.len(),
        results,
    }))
}

// ============ GET /case/{case_id} ============

async fn handle_case(
    State(state): State<AppState>,
    Path(case_id): Path<String>,
) -> Result<Json<CaseDetails>, AppError> {
    let details = get::get_case_details(state.store.as_ref(), &case_id)
        .await
        .map_err(classify_error)?;
    Ok(Json(details))
}

// ============ GET /stats ============

async fn handle_stats(State(state): State<AppState>) -> Result<Json<CorpusStats>, AppError> {
    let stats = stats::corpus_stats(state.store.as_ref(), &state.config)
        .await
        .map_err(classify_error)?;
    Ok(Json(stats))
}
