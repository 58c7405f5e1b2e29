use lynx_common::any_to_json;
use polars::prelude::{AnyValue, DataFrame};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, error, info};

use crate::client::ImportClient;
use crate::error::LoadError;
use crate::retry::{RetryPolicy, Sleeper, ThreadSleeper};

/// Default number of records per import request.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Pushes a transformed batch to its destination.
pub trait DataLoader {
    /// `Ok` means every chunk of the batch was accepted.
    fn load(&mut self, batch: &DataFrame) -> Result<LoadSummary, LoadError>;

    fn describe(&self) -> String;
}

/// One chunk as it was sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkReport {
    pub index: usize,
    pub rows: usize,
    /// Requests made for this chunk; zero when nothing was sent.
    pub attempts: u32,
    pub import_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub rows: usize,
    pub chunks: Vec<ChunkReport>,
}

impl LoadSummary {
    pub fn total_attempts(&self) -> u32 {
        self.chunks.iter().map(|chunk| chunk.attempts).sum()
    }
}

/// Convert every row of `batch` to a JSON object keyed by column name.
pub fn batch_to_records(batch: &DataFrame) -> Vec<Value> {
    let columns = batch.get_columns();
    (0..batch.height())
        .map(|row| {
            let record: Map<String, Value> = columns
                .iter()
                .map(|column| {
                    let value = column.get(row).unwrap_or(AnyValue::Null);
                    (column.name().to_string(), any_to_json(value))
                })
                .collect();
            Value::Object(record)
        })
        .collect()
}

/// Sends batches through an [`ImportClient`] in fixed-size chunks.
pub struct ImportLoader<C> {
    client: C,
    chunk_size: usize,
    retry: RetryPolicy,
    sleeper: Box<dyn Sleeper>,
}

impl<C: ImportClient> ImportLoader<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            chunk_size: DEFAULT_CHUNK_SIZE,
            retry: RetryPolicy::default(),
            sleeper: Box::new(ThreadSleeper),
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Box<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    fn send_chunk(&mut self, index: usize, nodes: &[Value]) -> Result<ChunkReport, LoadError> {
        let client = &mut self.client;
        let outcome = self.retry.run(self.sleeper.as_mut(), |attempt| {
            debug!(chunk = index, attempt, rows = nodes.len(), "sending chunk");
            let response = client.create_import(nodes)?;
            if response.status.is_accepted() {
                Ok(response)
            } else {
                Err(LoadError::Rejected {
                    status: response.status.to_string(),
                    import_id: response.id,
                })
            }
        });

        match outcome {
            Ok((response, attempts)) => {
                debug!(
                    chunk = index,
                    attempts,
                    status = %response.status,
                    "chunk accepted"
                );
                Ok(ChunkReport {
                    index,
                    rows: nodes.len(),
                    attempts,
                    import_id: response.id,
                })
            }
            Err((last, attempts)) => {
                error!(chunk = index, attempts, error = %last, "chunk failed");
                Err(LoadError::ChunkFailed {
                    chunk_index: index,
                    attempts,
                    source: Box::new(last),
                })
            }
        }
    }
}

impl<C: ImportClient> DataLoader for ImportLoader<C> {
    fn load(&mut self, batch: &DataFrame) -> Result<LoadSummary, LoadError> {
        if self.chunk_size == 0 {
            return Err(LoadError::InvalidChunkSize);
        }
        let records = batch_to_records(batch);
        let mut summary = LoadSummary {
            rows: records.len(),
            chunks: Vec::new(),
        };
        for (index, nodes) in records.chunks(self.chunk_size).enumerate() {
            summary.chunks.push(self.send_chunk(index, nodes)?);
        }
        info!(
            rows = summary.rows,
            chunks = summary.chunks.len(),
            "batch loaded"
        );
        Ok(summary)
    }

    fn describe(&self) -> String {
        format!(
            "{} in chunks of {} ({} attempts)",
            self.client.describe(),
            self.chunk_size,
            self.retry.max_attempts
        )
    }
}

/// Counts what would be sent without sending anything.
#[derive(Debug, Clone)]
pub struct DryRunLoader {
    chunk_size: usize,
    rows_seen: usize,
}

impl DryRunLoader {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            rows_seen: 0,
        }
    }

    pub fn rows_seen(&self) -> usize {
        self.rows_seen
    }
}

impl Default for DryRunLoader {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl DataLoader for DryRunLoader {
    fn load(&mut self, batch: &DataFrame) -> Result<LoadSummary, LoadError> {
        if self.chunk_size == 0 {
            return Err(LoadError::InvalidChunkSize);
        }
        let rows = batch.height();
        let chunks = (0..rows)
            .step_by(self.chunk_size)
            .enumerate()
            .map(|(index, start)| ChunkReport {
                index,
                rows: self.chunk_size.min(rows - start),
                attempts: 0,
                import_id: None,
            })
            .collect();
        self.rows_seen += rows;
        info!(rows, "dry run, batch not sent");
        Ok(LoadSummary { rows, chunks })
    }

    fn describe(&self) -> String {
        format!("dry run in chunks of {}", self.chunk_size)
    }
}
