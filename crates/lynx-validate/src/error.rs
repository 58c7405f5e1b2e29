//! Error types for schema loading and validation.

use std::path::PathBuf;

use lynx_model::FieldType;
use thiserror::Error;

/// A schema declaration that cannot be used for validation.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read schema {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse schema {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid pattern {pattern:?} on field '{field}' of {metatype}: {source}")]
    InvalidPattern {
        metatype: String,
        field: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// `pattern` declared on a non-string field.
    #[error("pattern on field '{field}' of {metatype} requires a string field, found {data_type}")]
    PatternOnNonString {
        metatype: String,
        field: String,
        data_type: FieldType,
    },

    /// `min`/`max` declared on a field type without an ordering.
    #[error("min/max on field '{field}' of {metatype} is not supported for {data_type} fields")]
    BoundOnUnorderedField {
        metatype: String,
        field: String,
        data_type: FieldType,
    },

    #[error("bound {bound} on field '{field}' of {metatype} is not a valid {data_type} bound")]
    InvalidBound {
        metatype: String,
        field: String,
        bound: String,
        data_type: FieldType,
    },
}

/// Validation could not run at all.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unknown metatype: {0}")]
    UnknownEntityType(String),
}
