//! Delimited file source read in fixed-size chunks.

use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use csv::{Reader, ReaderBuilder, StringRecord};
use polars::prelude::*;
use tracing::debug;

use crate::error::SourceError;
use crate::frame::column_from_text;
use crate::source::{BatchIter, DEFAULT_BATCH_SIZE, DataSource, already_extracted};

/// Reads a delimited file `batch_size` records at a time.
///
/// The file is opened on the first pull, so a missing file surfaces as
/// [`SourceError::NotFound`] from the iterator rather than from `new`.
/// Rows with the wrong number of fields are reported as errors, never skipped.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
    batch_size: usize,
    delimiter: u8,
    has_headers: bool,
    extracted: bool,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            delimiter: b',',
            has_headers: true,
            extracted: false,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Without headers, columns are named `column_1`, `column_2`, ...
    pub fn with_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataSource for CsvSource {
    fn extract(&mut self) -> BatchIter<'_> {
        if self.extracted {
            return already_extracted();
        }
        self.extracted = true;
        if self.batch_size == 0 {
            return Box::new(std::iter::once(Err(SourceError::InvalidBatchSize)));
        }
        Box::new(CsvBatches {
            source: self,
            reader: None,
            headers: None,
            done: false,
        })
    }

    fn describe(&self) -> String {
        format!("csv file {}", self.path.display())
    }
}

struct CsvBatches<'a> {
    source: &'a CsvSource,
    reader: Option<Reader<File>>,
    headers: Option<Vec<String>>,
    done: bool,
}

impl CsvBatches<'_> {
    fn open(&mut self) -> Result<(), SourceError> {
        let config = self.source;
        let path = &config.path;
        let file = File::open(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => SourceError::NotFound { path: path.clone() },
            _ => SourceError::Io {
                path: path.clone(),
                source,
            },
        })?;
        let mut reader = ReaderBuilder::new()
            .delimiter(self.source.delimiter)
            .has_headers(self.source.has_headers)
            .from_reader(file);
        if self.source.has_headers {
            let headers = reader.headers().map_err(|source| self.csv_error(source))?;
            self.headers = Some(headers.iter().map(normalize_header).collect());
        }
        debug!(path = %path.display(), "opened csv source");
        self.reader = Some(reader);
        Ok(())
    }

    fn next_batch(&mut self) -> Result<Option<DataFrame>, SourceError> {
        if self.reader.is_none() {
            self.open()?;
        }
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };

        let mut rows: Vec<StringRecord> = Vec::with_capacity(self.source.batch_size);
        let mut record = StringRecord::new();
        while rows.len() < self.source.batch_size {
            let more = reader
                .read_record(&mut record)
                .map_err(|source| SourceError::Csv {
                    path: self.source.path.clone(),
                    source,
                })?;
            if !more {
                break;
            }
            rows.push(record.clone());
        }
        if rows.is_empty() {
            return Ok(None);
        }

        let headers = self.headers.get_or_insert_with(|| {
            (1..=rows[0].len())
                .map(|idx| format!("column_{idx}"))
                .collect()
        });
        let columns = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let cells: Vec<Option<String>> = rows
                    .iter()
                    .map(|row| {
                        row.get(idx)
                            .filter(|cell| !cell.trim().is_empty())
                            .map(str::to_string)
                    })
                    .collect();
                column_from_text(name, &cells)
            })
            .collect();
        Ok(Some(DataFrame::new(columns)?))
    }

    fn csv_error(&self, source: csv::Error) -> SourceError {
        SourceError::Csv {
            path: self.source.path.clone(),
            source,
        }
    }
}

impl Iterator for CsvBatches<'_> {
    type Item = Result<DataFrame, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_batch() {
            Ok(Some(batch)) => Some(Ok(batch)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

fn normalize_header(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}
