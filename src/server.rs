//!
//! schooladmin mock data store server
//! ----------------------------------
//! Axum HTTP front for `MockBackend`: a json-server style REST API over the
//! demo collections (users, students, teachers, classes, attendance, fees,
//! profiles).
//!
//! Routes:
//! - `GET /{collection}` list, with equality filters from the query string.
//! - `POST /{collection}` create; the server assigns the id.
//! - `GET|PUT|DELETE /{collection}/{id}` read, whole-record replace, delete.
//!
//! Errors are returned as `{ "code", "message" }` with the status from
//! `AppError::http_status`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};

pub mod backend;
pub mod seed;

pub use backend::MockBackend;

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<MockBackend>,
}

fn respond(result: AppResult<Value>, ok: StatusCode) -> (StatusCode, Json<Value>) {
    match result {
        Ok(v) => (ok, Json(v)),
        Err(e) => {
            let status = StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            warn!(target: "mock_api", "{} {}", status, e);
            (status, Json(json!({ "code": e.code_str(), "message": e.message() })))
        }
    }
}

fn parse_id(raw: &str) -> AppResult<u64> {
    raw.parse::<u64>()
        .map_err(|_| AppError::NotFound { code: "not_found".into(), message: format!("no record '{}'", raw) })
}

async fn list(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(filters): Query<Vec<(String, String)>>,
) -> impl IntoResponse {
    respond(state.backend.list(&collection, &filters).map(Value::Array), StatusCode::OK)
}

async fn create(State(state): State<AppState>, Path(collection): Path<String>, Json(body): Json<Value>) -> impl IntoResponse {
    respond(state.backend.create(&collection, body), StatusCode::CREATED)
}

async fn read(State(state): State<AppState>, Path((collection, id)): Path<(String, String)>) -> impl IntoResponse {
    respond(parse_id(&id).and_then(|id| state.backend.get(&collection, id)), StatusCode::OK)
}

async fn replace(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    respond(parse_id(&id).and_then(|id| state.backend.replace(&collection, id, body)), StatusCode::OK)
}

async fn remove(State(state): State<AppState>, Path((collection, id)): Path<(String, String)>) -> impl IntoResponse {
    respond(parse_id(&id).and_then(|id| state.backend.remove(&collection, id)).map(|_| json!({})), StatusCode::OK)
}

pub fn router(backend: Arc<MockBackend>) -> Router {
    Router::new()
        .route("/", get(|| async { "schooladmin mock api ok" }))
        .route("/{collection}", get(list).post(create))
        .route("/{collection}/{id}", get(read).put(replace).delete(remove))
        .with_state(AppState { backend })
}

/// Serve on an already-bound listener until the task is dropped.
pub async fn serve(listener: TcpListener, backend: Arc<MockBackend>) -> anyhow::Result<()> {
    axum::serve(listener, router(backend)).await?;
    Ok(())
}

fn log_startup(backend: &MockBackend, addr: &SocketAddr) {
    let cwd = std::env::current_dir().ok();
    info!(target: "startup", "mock data store starting on {} (cwd={:?})", addr, cwd);
    for name in backend.collection_names() {
        info!(target: "startup", "- /{}: {} records", name, backend.len(&name));
    }
}

/// Start the mock data store with the demo data set on the given port.
pub async fn run_with_port(port: u16) -> anyhow::Result<()> {
    let backend = Arc::new(MockBackend::seeded());
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    log_startup(&backend, &addr);
    let listener = TcpListener::bind(addr).await?;
    info!("Starting server on {}", addr);
    serve(listener, backend).await
}
