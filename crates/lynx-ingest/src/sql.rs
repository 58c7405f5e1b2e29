//! SQLite query source.

use std::path::{Path, PathBuf};

use polars::prelude::{Column, DataFrame};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use serde_json::{Number, Value};
use tracing::debug;

use crate::error::SourceError;
use crate::frame::column_from_json;
use crate::source::{BatchIter, DEFAULT_BATCH_SIZE, DataSource, already_extracted, buffered};

/// Runs one read-only query and buffers the result into fixed-size batches.
#[derive(Debug, Clone)]
pub struct SqlSource {
    database: PathBuf,
    query: String,
    batch_size: usize,
    extracted: bool,
}

impl SqlSource {
    pub fn new(database: impl Into<PathBuf>, query: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            query: query.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            extracted: false,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn database(&self) -> &Path {
        &self.database
    }

    fn fetch(&self) -> Result<DataFrame, SourceError> {
        if !self.database.exists() {
            return Err(SourceError::NotFound {
                path: self.database.clone(),
            });
        }
        let sql_error = |source| SourceError::Sql {
            database: self.database.clone(),
            source,
        };

        let conn = Connection::open_with_flags(&self.database, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(sql_error)?;
        let mut stmt = conn.prepare(&self.query).map_err(sql_error)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();

        let mut values: Vec<Vec<Value>> = vec![Vec::new(); names.len()];
        let mut rows = stmt.query([]).map_err(sql_error)?;
        while let Some(row) = rows.next().map_err(sql_error)? {
            for (idx, column) in values.iter_mut().enumerate() {
                let cell = row.get_ref(idx).map_err(sql_error)?;
                column.push(cell_to_json(cell));
            }
        }
        debug!(
            database = %self.database.display(),
            rows = values.first().map_or(0, Vec::len),
            "query returned"
        );

        let columns: Vec<Column> = names
            .iter()
            .zip(&values)
            .map(|(name, cells)| column_from_json(name, cells))
            .collect();
        Ok(DataFrame::new(columns)?)
    }
}

impl DataSource for SqlSource {
    fn extract(&mut self) -> BatchIter<'_> {
        if self.extracted {
            return already_extracted();
        }
        self.extracted = true;
        let this: &Self = self;
        buffered(move || this.fetch(), this.batch_size)
    }

    fn describe(&self) -> String {
        format!("sqlite query on {}", self.database.display())
    }
}

/// Non-finite reals become null, the same as SQLite does for NaN on write.
fn cell_to_json(cell: ValueRef<'_>) -> Value {
    match cell {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(n) => Value::from(n),
        ValueRef::Real(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(format!("<blob {} bytes>", b.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_finite_reals_are_null() {
        assert_eq!(cell_to_json(ValueRef::Real(f64::NAN)), Value::Null);
        assert_eq!(cell_to_json(ValueRef::Real(f64::INFINITY)), Value::Null);
        assert_eq!(cell_to_json(ValueRef::Real(-2.5)), serde_json::json!(-2.5));
    }

    #[test]
    fn blobs_are_summarised() {
        assert_eq!(cell_to_json(ValueRef::Blob(&[1, 2, 3])), Value::from("<blob 3 bytes>"));
    }
}
