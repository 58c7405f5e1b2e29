//! Schema declarations stored as TOML.
//!
//! Each metatype is an array of tables:
//!
//! ```toml
//! [[Process]]
//! name = "duration"
//! data_type = "number"
//! required = true
//! constraints = { min = 0, max = 1440 }
//! ```

use std::path::Path;

use lynx_model::Schema;
use tracing::debug;

use crate::error::SchemaError;

pub fn load_schema(path: &Path) -> Result<Schema, SchemaError> {
    let text = std::fs::read_to_string(path).map_err(|source| SchemaError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let schema: Schema = toml::from_str(&text).map_err(|source| SchemaError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), metatypes = schema.len(), "loaded schema");
    Ok(schema)
}
