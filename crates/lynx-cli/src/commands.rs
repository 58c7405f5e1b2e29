use std::path::Path;

use anyhow::{Context, Result};
use lynx_core::{BuildOptions, Credentials, PipelineConfig, build_pipeline};
use lynx_ingest::{CsvSource, DataSource};
use lynx_validate::{SchemaValidator, ValidationError, ValidationErrors};
use tracing::{debug, info, info_span};

use crate::types::{RunOutcome, ValidateOutcome, ValidateRequest};

/// Run the pipeline described by `config_path`.
///
/// A failed run is still an `Ok` outcome; its state carries the error.
/// `Err` means the pipeline could not be assembled.
pub fn run_pipeline(config_path: &Path, dry_run: bool) -> Result<RunOutcome> {
    let config = PipelineConfig::from_path(config_path)
        .with_context(|| format!("load pipeline {}", config_path.display()))?;
    let options = BuildOptions {
        dry_run,
        credentials: Credentials::from_env(),
    };
    let mut pipeline = build_pipeline(&config, &options).context("assemble pipeline")?;
    if let Err(error) = pipeline.run() {
        debug!(%error, "run ended with an error");
    }
    Ok(RunOutcome {
        name: pipeline.name().to_string(),
        dry_run,
        state: pipeline.state().clone(),
    })
}

/// Validate every batch of a CSV file against one metatype.
///
/// Findings from all batches are merged; identical messages appear once.
pub fn validate_csv(request: &ValidateRequest) -> Result<ValidateOutcome> {
    let validator = SchemaValidator::from_path(&request.schema)
        .with_context(|| format!("load schema {}", request.schema.display()))?;
    if !validator.has_metatype(&request.metatype) {
        return Err(ValidationError::UnknownEntityType(request.metatype.clone()).into());
    }

    let span = info_span!("validate", metatype = %request.metatype);
    let _guard = span.enter();

    let mut source = CsvSource::new(&request.csv)
        .with_batch_size(request.batch_size)
        .with_delimiter(request.delimiter);
    let mut outcome = ValidateOutcome {
        metatype: request.metatype.clone(),
        rows: 0,
        batches: 0,
        errors: ValidationErrors::new(),
    };
    for batch in source.extract() {
        let batch = batch.with_context(|| format!("read {}", request.csv.display()))?;
        let errors = if request.strict {
            validator.validate_strict(&batch, &request.metatype)?
        } else {
            validator.validate(&batch, &request.metatype)?
        };
        debug!(batch = outcome.batches, errors = errors.len(), "batch validated");
        outcome.rows += batch.height();
        outcome.batches += 1;
        outcome.errors.merge(errors);
    }
    info!(
        rows = outcome.rows,
        errors = outcome.errors.len(),
        "validation finished"
    );
    Ok(outcome)
}
