//! JSON document source and the shared record-list selection rule.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use polars::prelude::DataFrame;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::SourceError;
use crate::frame::frame_from_records;
use crate::source::{BatchIter, DEFAULT_BATCH_SIZE, DataSource, already_extracted, buffered};

/// Pull the list of records out of a JSON payload.
///
/// A top-level array is used as is. For an object, the first key (in
/// document order) whose value is an array wins. Every element of the chosen
/// list must be a JSON object.
pub fn select_records(payload: Value, origin: &str) -> Result<Vec<Map<String, Value>>, SourceError> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(map) => map
            .into_iter()
            .find_map(|(_, value)| match value {
                Value::Array(items) => Some(items),
                _ => None,
            })
            .ok_or_else(|| SourceError::NoRecordList {
                origin: origin.to_string(),
            })?,
        _ => {
            return Err(SourceError::NoRecordList {
                origin: origin.to_string(),
            });
        }
    };
    into_records(items, origin)
}

pub(crate) fn into_records(
    items: Vec<Value>,
    origin: &str,
) -> Result<Vec<Map<String, Value>>, SourceError> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(record) => Ok(record),
            _ => Err(SourceError::NotARecord {
                origin: origin.to_string(),
                index,
            }),
        })
        .collect()
}

/// Reads a JSON document once and serves its records in fixed-size batches.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
    root_element: Option<String>,
    batch_size: usize,
    extracted: bool,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            root_element: None,
            batch_size: DEFAULT_BATCH_SIZE,
            extracted: false,
        }
    }

    /// Read the array under this top-level key instead of guessing.
    pub fn with_root_element(mut self, element: impl Into<String>) -> Self {
        self.root_element = Some(element.into());
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn fetch(&self) -> Result<DataFrame, SourceError> {
        let origin = self.path.display().to_string();
        let text = std::fs::read_to_string(&self.path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => SourceError::NotFound {
                path: self.path.clone(),
            },
            _ => SourceError::Io {
                path: self.path.clone(),
                source,
            },
        })?;
        let payload: Value = serde_json::from_str(&text).map_err(|source| SourceError::Json {
            origin: origin.clone(),
            source,
        })?;

        let records = match &self.root_element {
            Some(element) => {
                let items = match payload {
                    Value::Object(mut map) => match map.remove(element) {
                        Some(Value::Array(items)) => Some(items),
                        _ => None,
                    },
                    _ => None,
                };
                let items = items.ok_or_else(|| SourceError::MissingRootElement {
                    origin: origin.clone(),
                    element: element.clone(),
                })?;
                into_records(items, &origin)?
            }
            None => select_records(payload, &origin)?,
        };
        debug!(path = %origin, records = records.len(), "loaded json source");
        Ok(frame_from_records(&records)?)
    }
}

impl DataSource for JsonFileSource {
    fn extract(&mut self) -> BatchIter<'_> {
        if self.extracted {
            return already_extracted();
        }
        self.extracted = true;
        let this: &Self = self;
        buffered(move || this.fetch(), this.batch_size)
    }

    fn describe(&self) -> String {
        format!("json file {}", self.path.display())
    }
}
