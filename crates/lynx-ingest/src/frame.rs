//! Batch construction with column type inference.
//!
//! Text and JSON cells are collected per column, then each column takes the
//! narrowest dtype all of its non-null cells agree on: Int64, Float64,
//! Boolean, or String as the fallback.

use polars::prelude::*;
use serde_json::{Map, Value};

/// Build a column from raw text cells. `None` cells become nulls.
pub fn column_from_text(name: &str, cells: &[Option<String>]) -> Column {
    let present = || cells.iter().flatten().map(|cell| cell.trim());

    if present().next().is_none() {
        return Series::new(name.into(), cells.to_vec()).into_column();
    }
    if present().all(|cell| cell.parse::<i64>().is_ok()) {
        let values: Vec<Option<i64>> = cells
            .iter()
            .map(|cell| cell.as_deref().and_then(|c| c.trim().parse().ok()))
            .collect();
        return Series::new(name.into(), values).into_column();
    }
    if present().all(|cell| cell.parse::<f64>().is_ok()) {
        let values: Vec<Option<f64>> = cells
            .iter()
            .map(|cell| cell.as_deref().and_then(|c| c.trim().parse().ok()))
            .collect();
        return Series::new(name.into(), values).into_column();
    }
    if present().all(|cell| text_bool(cell).is_some()) {
        let values: Vec<Option<bool>> = cells
            .iter()
            .map(|cell| cell.as_deref().and_then(text_bool))
            .collect();
        return Series::new(name.into(), values).into_column();
    }
    Series::new(name.into(), cells.to_vec()).into_column()
}

/// Build a column from JSON values. `null` becomes a null cell; arrays and
/// objects are kept as their JSON text.
pub fn column_from_json(name: &str, values: &[Value]) -> Column {
    let present = || values.iter().filter(|value| !value.is_null());

    if present().next().is_some() {
        if present().all(Value::is_boolean) {
            let cells: Vec<Option<bool>> = values.iter().map(Value::as_bool).collect();
            return Series::new(name.into(), cells).into_column();
        }
        if present().all(|value| value.as_i64().is_some()) {
            let cells: Vec<Option<i64>> = values.iter().map(Value::as_i64).collect();
            return Series::new(name.into(), cells).into_column();
        }
        if present().all(Value::is_number) {
            let cells: Vec<Option<f64>> = values.iter().map(Value::as_f64).collect();
            return Series::new(name.into(), cells).into_column();
        }
    }
    let cells: Vec<Option<String>> = values.iter().map(json_text).collect();
    Series::new(name.into(), cells).into_column()
}

/// Build a batch from JSON records.
///
/// Columns appear in first-seen key order across all records; a record
/// lacking a key gets a null in that column.
pub fn frame_from_records(records: &[Map<String, Value>]) -> PolarsResult<DataFrame> {
    let mut names: Vec<&str> = Vec::new();
    for record in records {
        for key in record.keys() {
            if !names.contains(&key.as_str()) {
                names.push(key.as_str());
            }
        }
    }
    let columns = names
        .iter()
        .map(|name| {
            let values: Vec<Value> = records
                .iter()
                .map(|record| record.get(*name).cloned().unwrap_or(Value::Null))
                .collect();
            column_from_json(name, &values)
        })
        .collect();
    DataFrame::new(columns)
}

/// Split a frame into consecutive slices of at most `batch_size` rows.
///
/// An empty frame yields no batches.
pub fn partition(frame: &DataFrame, batch_size: usize) -> Vec<DataFrame> {
    let height = frame.height();
    if batch_size == 0 {
        return vec![frame.clone()];
    }
    (0..height)
        .step_by(batch_size)
        .map(|offset| frame.slice(offset as i64, batch_size))
        .collect()
}

fn text_bool(cell: &str) -> Option<bool> {
    let cell = cell.trim();
    if cell.eq_ignore_ascii_case("true") {
        Some(true)
    } else if cell.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn json_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
