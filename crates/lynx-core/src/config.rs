//! TOML pipeline description.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use lynx_ingest::DEFAULT_BATCH_SIZE;
use lynx_load::Backoff;
use lynx_model::MappingConfig;
use serde::Deserialize;

use crate::error::ConfigError;

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_true() -> bool {
    true
}

fn default_delimiter() -> String {
    ",".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_chunk_size() -> usize {
    1000
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    5000
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub source: SourceConfig,
    #[serde(default)]
    pub mapping: MappingConfig,
    #[serde(default)]
    pub validation: Option<ValidationConfig>,
    #[serde(default)]
    pub target: Option<TargetConfig>,
    #[serde(default)]
    pub loader: LoaderConfig,
}

/// Where batches come from, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
    Csv(CsvSourceConfig),
    Json(JsonSourceConfig),
    Api(ApiSourceConfig),
    Sql(SqlSourceConfig),
}

impl SourceConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            SourceConfig::Csv(_) => "csv",
            SourceConfig::Json(_) => "json",
            SourceConfig::Api(_) => "api",
            SourceConfig::Sql(_) => "sql",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CsvSourceConfig {
    pub path: PathBuf,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    #[serde(default = "default_true")]
    pub has_headers: bool,
}

impl CsvSourceConfig {
    pub fn delimiter_byte(&self) -> Result<u8, ConfigError> {
        match self.delimiter.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ if self.delimiter == "\\t" => Ok(b'\t'),
            _ => Err(ConfigError::InvalidDelimiter {
                value: self.delimiter.clone(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonSourceConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub root_element: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiSourceConfig {
    pub base_url: String,
    pub endpoint: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SqlSourceConfig {
    pub database: PathBuf,
    pub query: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

/// Turns on schema validation of every transformed batch.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationConfig {
    pub schema: PathBuf,
    pub metatype: String,
    #[serde(default)]
    pub reject_unknown_columns: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    pub base_url: String,
    pub container_id: String,
    pub data_source_id: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoaderConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default)]
    pub backoff: Backoff,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            backoff: Backoff::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse a pipeline file, resolving relative paths against its directory.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: PipelineConfig =
            toml::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Parse from a string; paths are left as written.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn resolve_paths(&mut self, base: &Path) {
        match &mut self.source {
            SourceConfig::Csv(csv) => resolve(base, &mut csv.path),
            SourceConfig::Json(json) => resolve(base, &mut json.path),
            SourceConfig::Sql(sql) => resolve(base, &mut sql.database),
            SourceConfig::Api(_) => {}
        }
        if let Some(validation) = &mut self.validation {
            resolve(base, &mut validation.schema);
        }
    }

    /// Name used for the run's log span.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.source.kind())
    }
}

fn resolve(base: &Path, path: &mut PathBuf) {
    if path.is_relative() {
        *path = base.join(&*path);
    }
}
