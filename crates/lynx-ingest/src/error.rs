//! Error types for batch extraction.

use std::path::PathBuf;

use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors raised while extracting batches from a source.
#[derive(Debug, Error)]
pub enum SourceError {
    // === File System Errors ===
    /// Input file does not exist.
    #[error("input file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Parse Errors ===
    /// A row could not be parsed; extraction stops at this row.
    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("invalid JSON from {origin}: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    /// Payload has neither a top-level array nor a list-valued key.
    #[error("payload from {origin} contains no list of records")]
    NoRecordList { origin: String },

    #[error("root element '{element}' in {origin} is missing or not an array")]
    MissingRootElement { origin: String, element: String },

    #[error("record {index} from {origin} is not a JSON object")]
    NotARecord { origin: String, index: usize },

    // === Network Errors ===
    #[error("invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} returned HTTP {status}: {message}")]
    Status {
        url: String,
        status: u16,
        message: String,
    },

    // === Query Errors ===
    #[error("query against {database} failed: {source}")]
    Sql {
        database: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    // === Source Lifecycle ===
    #[error("batch size must be greater than zero")]
    InvalidBatchSize,

    /// `extract` was called a second time on the same source.
    #[error("source has already been extracted; create a new source to read again")]
    AlreadyExtracted,

    #[error("failed to build batch: {0}")]
    Frame(#[from] PolarsError),
}
