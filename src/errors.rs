//! Typed error hierarchy for the labelpipe pipeline.
//!
//! Two top-level enums cover the two fallible subsystems:
//! - `GatewayError` — completion-service transport and protocol failures
//! - `QueueError` — review-queue persistence failures
//!
//! A single-item run never lets either of these escape: gateway failures
//! are treated as decode failures at the stage that made the call, and
//! queue write failures during escalation are logged and swallowed.

use thiserror::Error;

/// Errors from the completion gateway (the generative backend).
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Completion request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Completion service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Completion response carried no message content")]
    EmptyResponse,

    #[error("Completion request timed out after {seconds}s")]
    Timeout { seconds: u64 },
}

/// Errors from the durable review-queue store.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Failed to create review queue directory {path}: {source}")]
    CreateDirFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write review item at {path}: {source}")]
    WriteFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read review queue directory {path}: {source}")]
    ReadDirFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize review item for {data_id}: {source}")]
    SerializeFailed {
        data_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("CSV export failed: {0}")]
    ExportFailed(String),
}
