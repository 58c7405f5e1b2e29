//! Build pipeline components from a [`PipelineConfig`].

use std::env;
use std::sync::Arc;
use std::time::Duration;

use lynx_ingest::{ApiSource, CsvSource, DataSource, JsonFileSource, SqlSource};
use lynx_load::{
    DataLoader, DryRunLoader, HttpImportClient, ImportLoader, ImportTarget, RetryPolicy,
};
use lynx_transform::{ColumnMappingTransformer, DataTransformer, SchemaTransformer};
use lynx_validate::SchemaValidator;
use tracing::{debug, info};

use crate::config::{LoaderConfig, PipelineConfig, SourceConfig, TargetConfig};
use crate::error::ConfigError;
use crate::orchestrator::PipelineOrchestrator;

pub const API_KEY_VAR: &str = "LYNX_API_KEY";
pub const API_SECRET_VAR: &str = "LYNX_API_SECRET";
pub const TOKEN_VAR: &str = "LYNX_TOKEN";

/// Credentials for the import API.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("api_secret", &self.api_secret.as_ref().map(|_| "***"))
            .field("token", &self.token.as_ref().map(|_| "***"))
            .finish()
    }
}

impl Credentials {
    /// Read `LYNX_API_KEY`, `LYNX_API_SECRET` and `LYNX_TOKEN`.
    pub fn from_env() -> Self {
        let read = |name: &str| env::var(name).ok().filter(|value| !value.is_empty());
        Self {
            api_key: read(API_KEY_VAR),
            api_secret: read(API_SECRET_VAR),
            token: read(TOKEN_VAR),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Count rows instead of sending them.
    pub dry_run: bool,
    pub credentials: Credentials,
}

/// Assemble an orchestrator for `config`.
pub fn build_pipeline(
    config: &PipelineConfig,
    options: &BuildOptions,
) -> Result<PipelineOrchestrator, ConfigError> {
    let source = build_source(&config.source)?;
    let transformer = build_transformer(config)?;
    let loader = if options.dry_run {
        Box::new(DryRunLoader::new(config.loader.chunk_size)) as Box<dyn DataLoader>
    } else {
        let target = config.target.as_ref().ok_or(ConfigError::MissingTarget)?;
        build_loader(target, &config.loader, &options.credentials)?
    };
    Ok(PipelineOrchestrator::new(source, transformer, loader).with_name(config.display_name()))
}

pub fn build_source(config: &SourceConfig) -> Result<Box<dyn DataSource>, ConfigError> {
    let source: Box<dyn DataSource> = match config {
        SourceConfig::Csv(csv) => Box::new(
            CsvSource::new(&csv.path)
                .with_batch_size(csv.batch_size)
                .with_delimiter(csv.delimiter_byte()?)
                .with_headers(csv.has_headers),
        ),
        SourceConfig::Json(json) => {
            let mut source = JsonFileSource::new(&json.path).with_batch_size(json.batch_size);
            if let Some(root) = &json.root_element {
                source = source.with_root_element(root);
            }
            Box::new(source)
        }
        SourceConfig::Api(api) => {
            let mut source = ApiSource::new(&api.base_url, &api.endpoint)
                .with_batch_size(api.batch_size)
                .with_timeout(Duration::from_secs(api.timeout_secs));
            for (name, value) in &api.headers {
                source = source.with_header(name, value);
            }
            for (name, value) in &api.params {
                source = source.with_param(name, value);
            }
            Box::new(source)
        }
        SourceConfig::Sql(sql) => Box::new(
            SqlSource::new(&sql.database, &sql.query).with_batch_size(sql.batch_size),
        ),
    };
    debug!(source = %source.describe(), "source configured");
    Ok(source)
}

pub fn build_transformer(
    config: &PipelineConfig,
) -> Result<Box<dyn DataTransformer>, ConfigError> {
    let mapping = config.mapping.clone();
    let Some(validation) = &config.validation else {
        return Ok(Box::new(ColumnMappingTransformer::new(mapping)));
    };
    let validator = Arc::new(SchemaValidator::from_path(&validation.schema)?);
    let transformer = SchemaTransformer::new(mapping, validator, &validation.metatype)?
        .reject_unknown_columns(validation.reject_unknown_columns);
    Ok(Box::new(transformer))
}

pub fn build_loader(
    target: &TargetConfig,
    loader: &LoaderConfig,
    credentials: &Credentials,
) -> Result<Box<dyn DataLoader>, ConfigError> {
    let import_target = ImportTarget::new(
        &target.base_url,
        &target.container_id,
        &target.data_source_id,
    );
    let mut client =
        HttpImportClient::new(import_target, Duration::from_secs(target.timeout_secs))?;
    match credentials {
        Credentials {
            token: Some(token), ..
        } => client = client.with_token(token),
        Credentials {
            api_key: Some(key),
            api_secret: Some(secret),
            ..
        } => client.authenticate(key, secret)?,
        Credentials {
            api_key: Some(_), ..
        } => return Err(ConfigError::IncompleteCredentials { present: API_KEY_VAR }),
        Credentials {
            api_secret: Some(_),
            ..
        } => {
            return Err(ConfigError::IncompleteCredentials {
                present: API_SECRET_VAR,
            });
        }
        _ => info!("no credentials configured, sending unauthenticated requests"),
    }
    let retry = RetryPolicy::new(loader.retry_attempts, Duration::from_millis(loader.retry_delay_ms))
        .with_backoff(loader.backoff);
    Ok(Box::new(
        ImportLoader::new(client)
            .with_chunk_size(loader.chunk_size)
            .with_retry(retry),
    ))
}
