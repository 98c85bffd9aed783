//! HTTP handlers for the job query API.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use common::{JobQuery, JobRecord, search};
use serde_json::{Value, json};
use tracing::debug;

use crate::store::{RecordStore, StoreError};

/// Shared application state
pub struct AppState {
    pub store: RecordStore,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/api/jobs", get(jobs_handler))
        .with_state(state)
}

/// Handler for GET /api/jobs?q=&location=&level=
async fn jobs_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<JobQuery>,
) -> Result<Json<Vec<JobRecord>>, StoreError> {
    let records = state.store.load().await?;
    let total = records.len();
    let hits = search(records, &query);
    debug!(?query, total, returned = hits.len(), "jobs query");
    Ok(Json(hits))
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Result<Json<Value>, StoreError> {
    let records = state.store.load().await?;
    Ok(Json(json!({
        "status": "ok",
        "store": state.store.kind(),
        "records": records.len(),
    })))
}

async fn root_handler() -> &'static str {
    "🔍 Vagas API\n\nEndpoints:\n  GET /api/jobs?q=<title>&location=<place>&level=<level> - Filter jobs\n  GET /health - Store status\n\nExample:\n  curl 'http://127.0.0.1:8000/api/jobs?q=backend&level=pleno'"
}
