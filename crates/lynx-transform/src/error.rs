use lynx_model::TargetType;
use lynx_validate::{ValidationError, ValidationErrors};
use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    /// Renaming would leave two columns with the same name.
    #[error("column mapping produces duplicate column '{column}'")]
    DuplicateColumn { column: String },

    /// A cell could not be cast to the requested type.
    #[error("cannot convert field '{field}' to {target}: value {value:?} at row {row}")]
    Conversion {
        field: String,
        target: TargetType,
        row: usize,
        value: String,
    },

    /// The transformed batch failed schema validation.
    #[error("batch failed validation for {metatype} ({} errors)\n{errors}", .errors.len())]
    Validation {
        metatype: String,
        errors: ValidationErrors,
    },

    #[error(transparent)]
    UnknownEntityType(#[from] ValidationError),

    #[error("dataframe operation failed: {0}")]
    Frame(#[from] PolarsError),
}
