//! Error types for loading.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    // === Transport ===
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} returned HTTP {status}: {message}")]
    Http {
        url: String,
        status: u16,
        message: String,
    },

    #[error("unexpected response from {url}: {message}")]
    InvalidResponse { url: String, message: String },

    #[error("authentication failed: {message}")]
    Auth { message: String },

    // === Import outcome ===
    /// The API answered but flagged the request as an error.
    #[error("import API reported an error: {message}")]
    Api { message: String },

    /// The import was created with a status that is not accepted.
    #[error("import {} returned status '{status}'", import_id.as_deref().unwrap_or("<unknown>"))]
    Rejected {
        status: String,
        import_id: Option<String>,
    },

    // === Loader ===
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,

    /// A chunk failed on every attempt; carries the last cause.
    #[error("chunk {chunk_index} failed after {attempts} attempts: {source}")]
    ChunkFailed {
        chunk_index: usize,
        attempts: u32,
        #[source]
        source: Box<LoadError>,
    },
}
