//! Batch transformers for the lynx pipeline.
//!
//! Transformers never mutate their input: each call returns a new frame.

pub mod convert;
pub mod error;
pub mod mapping;
pub mod schema;

pub use convert::convert_column;
pub use error::TransformError;
pub use mapping::ColumnMappingTransformer;
pub use schema::SchemaTransformer;

use polars::prelude::DataFrame;

/// Turns one batch into another.
pub trait DataTransformer {
    fn transform(&self, batch: &DataFrame) -> Result<DataFrame, TransformError>;

    /// Short human-readable description for logs.
    fn describe(&self) -> String;
}
