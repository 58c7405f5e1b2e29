//! Cell-by-cell column casts.
//!
//! Casts go through the shared value helpers so a conversion accepts exactly
//! what validation accepts. Nulls stay null for every target type.

use lynx_common::{any_to_bool, any_to_f64, any_to_i64, any_to_string, any_to_timestamp};
use lynx_model::TargetType;
use polars::prelude::*;

use crate::error::TransformError;

/// Cast `column` to `target`, failing on the first cell that does not fit.
///
/// Datetime results are stored with millisecond precision and no time zone.
pub fn convert_column(column: &Column, target: TargetType) -> Result<Column, TransformError> {
    let name = column.name().clone();
    match target {
        TargetType::String => {
            if matches!(column.dtype(), DataType::String) {
                return Ok(column.clone());
            }
            let values = convert_cells(column, target, |value| Some(any_to_string(value)))?;
            Ok(Column::new(name, values))
        }
        TargetType::Int64 => {
            if matches!(column.dtype(), DataType::Int64) {
                return Ok(column.clone());
            }
            let values = convert_cells(column, target, any_to_i64)?;
            Ok(Column::new(name, values))
        }
        TargetType::Float64 => {
            let values = convert_cells(column, target, any_to_f64)?;
            Ok(Column::new(name, values))
        }
        TargetType::Boolean => {
            let values = convert_cells(column, target, any_to_bool)?;
            Ok(Column::new(name, values))
        }
        TargetType::Datetime => {
            let millis = convert_cells(column, target, |value| {
                any_to_timestamp(value).map(|ts| ts.and_utc().timestamp_millis())
            })?;
            let series = Series::new(name, millis)
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
            Ok(series.into_column())
        }
    }
}

fn convert_cells<T>(
    column: &Column,
    target: TargetType,
    convert: impl Fn(AnyValue<'_>) -> Option<T>,
) -> Result<Vec<Option<T>>, TransformError> {
    (0..column.len())
        .map(|row| {
            let value = column.get(row).unwrap_or(AnyValue::Null);
            if value.is_null() {
                return Ok(None);
            }
            convert(value.clone())
                .map(Some)
                .ok_or_else(|| TransformError::Conversion {
                    field: column.name().to_string(),
                    target,
                    row,
                    value: any_to_string(value),
                })
        })
        .collect()
}
