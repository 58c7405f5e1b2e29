use std::sync::Arc;

use lynx_model::MappingConfig;
use lynx_validate::{SchemaValidator, ValidationError};
use polars::prelude::DataFrame;
use tracing::warn;

use crate::DataTransformer;
use crate::error::TransformError;
use crate::mapping::ColumnMappingTransformer;

/// Column mapping followed by schema validation of the mapped batch.
///
/// Any validation finding fails the whole batch; rows are never dropped.
#[derive(Debug, Clone)]
pub struct SchemaTransformer {
    mapping: ColumnMappingTransformer,
    validator: Arc<SchemaValidator>,
    metatype: String,
    reject_unknown_columns: bool,
}

impl SchemaTransformer {
    /// Fails if `metatype` is not declared by the validator's schema.
    pub fn new(
        config: MappingConfig,
        validator: Arc<SchemaValidator>,
        metatype: impl Into<String>,
    ) -> Result<Self, TransformError> {
        let metatype = metatype.into();
        if !validator.has_metatype(&metatype) {
            return Err(ValidationError::UnknownEntityType(metatype).into());
        }
        Ok(Self {
            mapping: ColumnMappingTransformer::new(config),
            validator,
            metatype,
            reject_unknown_columns: false,
        })
    }

    /// Also fail on columns the metatype does not declare.
    pub fn reject_unknown_columns(mut self, reject: bool) -> Self {
        self.reject_unknown_columns = reject;
        self
    }

    pub fn metatype(&self) -> &str {
        &self.metatype
    }
}

impl DataTransformer for SchemaTransformer {
    fn transform(&self, batch: &DataFrame) -> Result<DataFrame, TransformError> {
        let mapped = self.mapping.transform(batch)?;
        let errors = if self.reject_unknown_columns {
            self.validator.validate_strict(&mapped, &self.metatype)?
        } else {
            self.validator.validate(&mapped, &self.metatype)?
        };
        if !errors.is_empty() {
            warn!(
                metatype = %self.metatype,
                errors = errors.len(),
                "batch failed schema validation"
            );
            return Err(TransformError::Validation {
                metatype: self.metatype.clone(),
                errors,
            });
        }
        Ok(mapped)
    }

    fn describe(&self) -> String {
        format!("{} validated as {}", self.mapping.describe(), self.metatype)
    }
}
