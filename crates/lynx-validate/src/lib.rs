//! Schema validation for pipeline batches.
//!
//! A [`SchemaValidator`] checks a batch against the ordered field list of a
//! metatype and reports problems grouped by [`ErrorCategory`]. An empty
//! [`ValidationErrors`] means the batch is valid.

mod checks;
pub mod error;
pub mod report;
pub mod schema_file;
pub mod validator;

pub use error::{SchemaError, ValidationError};
pub use report::{ErrorCategory, ValidationErrors};
pub use schema_file::load_schema;
pub use validator::SchemaValidator;
