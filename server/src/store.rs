//! Where the query service reads records from.

use std::io::ErrorKind;
use std::path::PathBuf;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::{JobRecord, SupabaseSettings};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read store: {0}")]
    Io(#[from] std::io::Error),

    #[error("store is not a JSON array of records: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("store request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("store answered HTTP {0}")]
    Status(u16),
}

/// Every store failure looks the same to clients.
impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        error!(error = %self, "❌ Store unavailable");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "internal error"})),
        )
            .into_response()
    }
}

/// Records are re-read on every request so new collector runs show up
/// without a restart.
#[derive(Clone)]
pub enum RecordStore {
    File(PathBuf),
    Rest {
        client: reqwest::Client,
        settings: SupabaseSettings,
    },
}

impl RecordStore {
    pub fn kind(&self) -> &'static str {
        match self {
            RecordStore::File(_) => "file",
            RecordStore::Rest { .. } => "rest",
        }
    }

    pub async fn load(&self) -> Result<Vec<JobRecord>, StoreError> {
        match self {
            RecordStore::File(path) => {
                let content = match tokio::fs::read_to_string(path).await {
                    Ok(content) => content,
                    Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
                    Err(e) => return Err(e.into()),
                };
                if content.trim().is_empty() {
                    return Ok(vec![]);
                }
                Ok(serde_json::from_str(&content)?)
            }
            RecordStore::Rest { client, settings } => {
                let mut records: Vec<JobRecord> = Vec::new();
                loop {
                    let response = page_request(client, settings, records.len()).send().await?;
                    let status = response.status();
                    if !status.is_success() {
                        return Err(StoreError::Status(status.as_u16()));
                    }
                    let body = response.text().await?;
                    let page: Vec<JobRecord> = serde_json::from_str(&body)?;
                    let done = page.len() < SupabaseSettings::PAGE_SIZE;
                    records.extend(page);
                    if done {
                        return Ok(records);
                    }
                }
            }
        }
    }
}

/// Newest first, with `id` as tie-breaker so pages never overlap.
const REST_ORDER: &str = "date_posted.desc.nullslast,scraped_at.desc,id.asc";

fn page_request(
    client: &reqwest::Client,
    settings: &SupabaseSettings,
    offset: usize,
) -> reqwest::RequestBuilder {
    client
        .get(settings.table_endpoint())
        .query(&SupabaseSettings::page_query(REST_ORDER, offset))
        .header("apikey", &settings.service_key)
        .header("Authorization", settings.bearer())
}
