//! Error types for the harvesting core.

use std::time::Duration;

use thiserror::Error;

/// Result type for collection runs.
pub type HarvestResult<T> = Result<T, HarvestError>;

/// Faults that abort a collection run.
///
/// Missing fields and duplicate items never surface here; only a broken
/// navigation session does.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Failed to load {url}: {reason}")]
    Navigation { url: String, reason: String },
    #[error("Timed out after {timeout:?} waiting for `{marker}`")]
    MarkerTimeout { marker: String, timeout: Duration },
    #[error("Browser session error: {0}")]
    Session(String),
}

/// A single field lookup on a rendered item that could not be answered.
///
/// Always recovered inside the extractor by nulling the field.
#[derive(Debug, Error)]
pub enum FieldError {
    #[error("No element matches `{0}`")]
    NotFound(String),
    #[error("Unreadable element: {0}")]
    Unreadable(String),
}

/// Result type for per-field lookups.
pub type FieldResult<T> = Result<T, FieldError>;
