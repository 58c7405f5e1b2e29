//! Batch sources for the lynx pipeline.
//!
//! Every source yields a finite, lazy sequence of [`DataFrame`] batches in
//! input order. Sources are single-use: build a new instance to re-read.
//!
//! [`DataFrame`]: polars::prelude::DataFrame

pub mod api;
pub mod csv_source;
pub mod error;
pub mod frame;
pub mod json;
pub mod source;
pub mod sql;

pub use api::ApiSource;
pub use csv_source::CsvSource;
pub use error::SourceError;
pub use frame::{column_from_json, column_from_text, frame_from_records, partition};
pub use json::{JsonFileSource, select_records};
pub use source::{BatchIter, DEFAULT_BATCH_SIZE, DataSource};
pub use sql::SqlSource;
