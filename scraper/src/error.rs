//! Typed errors for the collector's I/O edges.
//!
//! None of these escape a run: callers log them and fall back to zero
//! results, the unavailable-page sentinel, or a counted failure.

use thiserror::Error;

/// Outbound HTTP calls (search, detail pages, geocoding, embeddings).
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("malformed payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("empty response from {0}")]
    Empty(String),
}

/// Writing a record to a sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("store rejected record {external_id}: HTTP {status}: {body}")]
    Rejected {
        external_id: String,
        status: u16,
        body: String,
    },
}
