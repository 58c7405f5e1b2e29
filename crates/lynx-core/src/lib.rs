//! Pipeline orchestration for the lynx ETL.
//!
//! [`PipelineOrchestrator`] drives one run: every batch from the source is
//! transformed and loaded before the next is extracted. [`PipelineConfig`]
//! describes a pipeline in TOML and assembles the components.

pub mod assemble;
pub mod config;
pub mod error;
pub mod orchestrator;

pub use assemble::{BuildOptions, Credentials, build_pipeline};
pub use config::{
    ApiSourceConfig, CsvSourceConfig, JsonSourceConfig, LoaderConfig, PipelineConfig,
    SourceConfig, SqlSourceConfig, TargetConfig, ValidationConfig,
};
pub use error::{ConfigError, PipelineError};
pub use orchestrator::PipelineOrchestrator;
