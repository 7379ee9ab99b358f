//! Shared error type for source adapters and the fetch collaborator.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by a [Source](crate::source::Source) operation.
///
/// Missing page nodes are never errors; adapters fall back to defaults instead.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Invalid URL: {input}: {reason}")]
    InvalidUrl { input: String, reason: String },

    // HTTP and network
    #[error("Network error: could not reach {url}: {source}")]
    Network { url: String, source: reqwest::Error },

    #[error("HTTP {status} when fetching: {url}")]
    HttpStatus {
        status: u16,
        url: String,
        /// Optional context (e.g. "listing page", "chapter page") for programmatic use.
        context: Option<String>,
    },

    #[error("Failed to read response body: {source}")]
    BodyRead { source: reqwest::Error },

    #[error("Could not save image to {path}: {source}")]
    ImageWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Parsing
    #[error("Invalid selector {selector:?}: {message}")]
    Selector { selector: String, message: String },

    // Host input
    #[error("Unknown value '{value}' for filter '{key}'.")]
    UnknownFilterValue { key: String, value: String },
}
