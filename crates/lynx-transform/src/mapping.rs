use std::collections::HashSet;

use lynx_model::{MappingConfig, MetadataValue};
use polars::prelude::*;
use tracing::debug;

use crate::DataTransformer;
use crate::convert::convert_column;
use crate::error::TransformError;

/// Renames columns, casts them, then injects metadata columns, in that order.
#[derive(Debug, Clone, Default)]
pub struct ColumnMappingTransformer {
    config: MappingConfig,
}

impl ColumnMappingTransformer {
    pub fn new(config: MappingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MappingConfig {
        &self.config
    }

    /// Apply every mapping in one pass. Unmapped columns keep their names.
    fn rename(&self, batch: &DataFrame) -> Result<DataFrame, TransformError> {
        let mut seen = HashSet::new();
        let mut columns = Vec::with_capacity(batch.width());
        for column in batch.get_columns() {
            let target = self.config.target_column(column.name().as_str());
            if !seen.insert(target.to_string()) {
                return Err(TransformError::DuplicateColumn {
                    column: target.to_string(),
                });
            }
            let mut renamed = column.clone();
            if renamed.name().as_str() != target {
                renamed.rename(target.into());
            }
            columns.push(renamed);
        }
        Ok(DataFrame::new(columns)?)
    }

    /// Cast configured columns, resolving each by its post-rename name.
    fn convert(&self, frame: &mut DataFrame) -> Result<(), TransformError> {
        for (source, target) in &self.config.type_conversions {
            let resolved = self.config.target_column(source);
            let name = if frame.column(resolved).is_ok() {
                resolved
            } else if frame.column(source).is_ok() {
                source.as_str()
            } else {
                debug!(column = %source, "conversion skipped, column not in batch");
                continue;
            };
            let converted = convert_column(frame.column(name)?, *target)?;
            frame.with_column(converted)?;
        }
        Ok(())
    }

    fn inject_metadata(&self, frame: &mut DataFrame) -> Result<(), TransformError> {
        let height = frame.height();
        for (key, value) in &self.config.metadata {
            let column = match value {
                MetadataValue::Bool(v) => Column::new(key.as_str().into(), vec![*v; height]),
                MetadataValue::Integer(v) => Column::new(key.as_str().into(), vec![*v; height]),
                MetadataValue::Float(v) => Column::new(key.as_str().into(), vec![*v; height]),
                MetadataValue::Text(v) => Column::new(key.as_str().into(), vec![v.as_str(); height]),
            };
            frame.with_column(column)?;
        }
        Ok(())
    }
}

impl DataTransformer for ColumnMappingTransformer {
    fn transform(&self, batch: &DataFrame) -> Result<DataFrame, TransformError> {
        let mut frame = self.rename(batch)?;
        self.convert(&mut frame)?;
        self.inject_metadata(&mut frame)?;
        Ok(frame)
    }

    fn describe(&self) -> String {
        format!(
            "column mapping ({} renames, {} conversions, {} metadata)",
            self.config.column_mappings.len(),
            self.config.type_conversions.len(),
            self.config.metadata.len()
        )
    }
}
