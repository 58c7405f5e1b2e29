//! Shared utilities for the lynx ETL crates.
//!
//! This crate provides the value-level helpers every pipeline stage needs
//! when looking inside a polars batch: string and numeric coercion of
//! `AnyValue`, JSON conversion for the import payload, and timestamp parsing.

pub mod values;
pub mod timestamp;

pub use values::{
    any_to_bool, any_to_f64, any_to_i64, any_to_json, any_to_string, format_numeric,
    is_numeric_dtype, parse_bool, parse_f64, parse_i64,
};
pub use timestamp::{any_to_timestamp, format_timestamp, parse_timestamp};
