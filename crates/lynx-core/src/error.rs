use std::path::PathBuf;

use lynx_ingest::SourceError;
use lynx_load::LoadError;
use lynx_model::{ModelError, PipelineStatus};
use lynx_transform::TransformError;
use lynx_validate::SchemaError;
use thiserror::Error;

/// Failure of a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("extraction failed: {0}")]
    Source(#[from] SourceError),

    #[error("transform failed: {0}")]
    Transform(#[from] TransformError),

    #[error("load failed: {0}")]
    Load(#[from] LoadError),

    /// The orchestrator holds state from an earlier run.
    #[error("pipeline already run (status: {status}); reset it first")]
    AlreadyRun { status: PipelineStatus },

    #[error(transparent)]
    State(#[from] ModelError),
}

/// Problem with a pipeline file or assembling its components.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid pipeline file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("delimiter must be a single ASCII character, got {value:?}")]
    InvalidDelimiter { value: String },

    #[error("no [target] table; one is required unless running dry")]
    MissingTarget,

    #[error("both LYNX_API_KEY and LYNX_API_SECRET must be set, only {present} is")]
    IncompleteCredentials { present: &'static str },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Load(#[from] LoadError),
}
