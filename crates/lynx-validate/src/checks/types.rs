//! Declared-type checks.
//!
//! Nulls never fail a type check. Typed columns pass when their dtype already
//! fits; string columns are checked value by value.

use lynx_common::{
    any_to_i64, any_to_string, is_numeric_dtype, parse_bool, parse_f64, parse_i64, parse_timestamp,
};
use lynx_model::FieldType;
use polars::prelude::{Column, DataType};
use serde_json::Value;

use super::present;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TypeMismatch {
    NotString,
    Invalid(String),
}

pub(crate) fn check_type(column: &Column, data_type: FieldType) -> Result<(), TypeMismatch> {
    let dtype = column.dtype();
    if matches!(dtype, DataType::Null) || column.null_count() == column.len() {
        return Ok(());
    }

    match data_type {
        FieldType::String => {
            if matches!(dtype, DataType::String) {
                Ok(())
            } else {
                Err(TypeMismatch::NotString)
            }
        }
        FieldType::Number => {
            if is_numeric_dtype(dtype) || matches!(dtype, DataType::Boolean) {
                return Ok(());
            }
            scan_strings(column, |text| parse_f64(text).is_some(), |value, idx| {
                format!("unable to parse string {value:?} at position {idx}")
            })
        }
        FieldType::Integer => {
            if is_integer_dtype(dtype) || matches!(dtype, DataType::Boolean) {
                return Ok(());
            }
            if matches!(dtype, DataType::Float32 | DataType::Float64) {
                return match present(column).find(|(_, value)| any_to_i64(value.clone()).is_none()) {
                    Some((idx, value)) => Err(TypeMismatch::Invalid(format!(
                        "value {} at position {idx} is not an integer",
                        any_to_string(value)
                    ))),
                    None => Ok(()),
                };
            }
            scan_strings(column, |text| parse_i64(text).is_some(), |value, idx| {
                format!("value {value:?} at position {idx} is not an integer")
            })
        }
        FieldType::Boolean => {
            if matches!(dtype, DataType::Boolean) || is_numeric_dtype(dtype) {
                return Ok(());
            }
            scan_strings(column, |text| parse_bool(text).is_some(), |value, idx| {
                format!("value {value:?} at position {idx} is not a boolean")
            })
        }
        FieldType::Datetime => {
            if matches!(dtype, DataType::Datetime(_, _) | DataType::Date) {
                return Ok(());
            }
            scan_strings(column, |text| parse_timestamp(text).is_some(), |value, idx| {
                format!("unable to parse {value:?} at position {idx} as a datetime")
            })
        }
        FieldType::Array => {
            if matches!(dtype, DataType::List(_)) {
                return Ok(());
            }
            scan_strings(column, |text| json_kind(text, Value::is_array), |value, idx| {
                format!("value {value:?} at position {idx} is not a JSON array")
            })
        }
        FieldType::Object => scan_strings(
            column,
            |text| json_kind(text, Value::is_object),
            |value, idx| format!("value {value:?} at position {idx} is not a JSON object"),
        ),
    }
}

/// Check every non-null cell of a string column; any other dtype fails.
fn scan_strings(
    column: &Column,
    accept: impl Fn(&str) -> bool,
    describe: impl Fn(&str, usize) -> String,
) -> Result<(), TypeMismatch> {
    let dtype = column.dtype();
    if !matches!(dtype, DataType::String) {
        return Err(TypeMismatch::Invalid(format!("unsupported column dtype {dtype}")));
    }
    for (idx, value) in present(column) {
        let text = any_to_string(value);
        if !accept(&text) {
            return Err(TypeMismatch::Invalid(describe(&text, idx)));
        }
    }
    Ok(())
}

fn json_kind(text: &str, kind: fn(&Value) -> bool) -> bool {
    serde_json::from_str::<Value>(text).is_ok_and(|value| kind(&value))
}

fn is_integer_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}
