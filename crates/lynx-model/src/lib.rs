pub mod error;
pub mod mapping;
pub mod schema;
pub mod state;

pub use error::ModelError;
pub use mapping::{MappingConfig, MetadataValue, TargetType};
pub use schema::{Bound, Constraints, FieldType, Schema, SchemaField};
pub use state::{PIPELINE_ERROR_KEY, PipelineState, PipelineStatus};
